pub mod args;
pub mod cli;
pub mod config;
pub mod decoders;
pub mod encoders;
pub mod logging;
pub mod pipeline;
pub mod repl;
pub mod runners;
pub mod stage;
