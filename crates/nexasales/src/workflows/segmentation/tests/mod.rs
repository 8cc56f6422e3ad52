mod common;
mod pipeline;
mod priority;
