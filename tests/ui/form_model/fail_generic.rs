#![allow(dead_code)]

use eduform::form::FormModel;

#[derive(FormModel)]
struct GenericForm<T> {
    value: T,
}

fn main() {}
