// Not every test binary uses every fixture helper.
#![allow(dead_code)]

pub mod fixtures;
