mod harness;
mod prompt;
