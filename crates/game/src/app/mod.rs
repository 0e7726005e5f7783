mod avatar;
mod bootstrap;
mod config;
mod loop_runner;
mod scene_impl;
mod session;

pub(crate) use loop_runner::run;
