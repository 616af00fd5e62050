// gantry/demos/cats_app/src/cats/service.rs

use gantry::Rejection;
use parking_lot::RwLock;

/// In-memory cat names.
#[derive(Debug)]
pub struct CatsService {
  cats: RwLock<Vec<String>>,
}

impl Default for CatsService {
  fn default() -> Self {
    Self {
      cats: RwLock::new(vec!["Tom".to_string(), "Jerry".to_string()]),
    }
  }
}

impl CatsService {
  pub fn find_all(&self) -> Vec<String> {
    self.cats.read().clone()
  }

  pub fn find_one(&self, id: i64) -> Result<String, Rejection> {
    usize::try_from(id)
      .ok()
      .and_then(|idx| self.cats.read().get(idx).cloned())
      .ok_or_else(|| Rejection::not_found(format!("Cat with ID {} not found", id)))
  }

  pub fn create(&self, name: String) {
    tracing::debug!(name = %name, "Adding cat.");
    self.cats.write().push(name);
  }
}
