#[cfg(unix)]
mod lifecycle;
mod vault;
