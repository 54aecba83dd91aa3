mod pool;
mod support;
