#![feature(test)]

extern crate test;

mod csp_channel {
    mod burst;
    mod create;
    mod latency;
    mod oneshot;
    mod select;
}
