pub mod http;
pub mod retry;

#[cfg(test)]
mod tests;
