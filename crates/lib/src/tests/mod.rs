
#[cfg(test)]
pub mod toml_mock;
