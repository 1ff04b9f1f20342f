#![allow(dead_code)]

use eduform::form::FormModel;

#[derive(FormModel)]
struct DraftForm {
    #[form(skip)]
    notes: String,
}

fn main() {}
