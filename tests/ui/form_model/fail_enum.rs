#![allow(dead_code)]

use eduform::form::FormModel;

#[derive(FormModel)]
enum Level {
    Beginner,
    Advanced,
}

fn main() {}
