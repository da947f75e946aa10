mod locks;
mod store;

#[cfg(test)]
mod test_utils;

pub use store::SessionStore;
