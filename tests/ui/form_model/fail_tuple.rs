#![allow(dead_code)]

use eduform::form::FormModel;

#[derive(FormModel)]
struct Scores(u32, u32);

fn main() {}
