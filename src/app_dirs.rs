use directories::BaseDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static BASE_DIRS: OnceLock<Option<BaseDirs>> = OnceLock::new();

fn base_dirs() -> Option<&'static BaseDirs> {
  BASE_DIRS.get_or_init(BaseDirs::new).as_ref()
}

pub const DATA_DIR_ENV: &str = "CSS_FINGERPRINT_DATA_DIR";

pub fn app_name() -> &'static str {
  if cfg!(debug_assertions) {
    "CssFingerprintDev"
  } else {
    "CssFingerprint"
  }
}

pub fn data_dir() -> PathBuf {
  #[cfg(test)]
  {
    if let Some(dir) = TEST_DATA_DIR.with(|cell| cell.borrow().clone()) {
      return dir;
    }
  }

  if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
    return PathBuf::from(dir);
  }

  match base_dirs() {
    Some(dirs) => dirs.data_local_dir().join(app_name()),
    None => PathBuf::from(".").join(app_name()),
  }
}

pub fn config_dir() -> PathBuf {
  match base_dirs() {
    Some(dirs) => dirs.config_dir().join(app_name()),
    None => data_dir(),
  }
}

pub fn database_path() -> PathBuf {
  data_dir().join("visits.sqlite3")
}

pub fn settings_file() -> PathBuf {
  config_dir().join("settings.json")
}

#[cfg(test)]
thread_local! {
  static TEST_DATA_DIR: std::cell::RefCell<Option<PathBuf>> = const { std::cell::RefCell::new(None) };
}

#[cfg(test)]
pub struct TestDirGuard;

#[cfg(test)]
impl Drop for TestDirGuard {
  fn drop(&mut self) {
    TEST_DATA_DIR.with(|cell| *cell.borrow_mut() = None);
  }
}

#[cfg(test)]
pub fn set_test_data_dir(dir: PathBuf) -> TestDirGuard {
  TEST_DATA_DIR.with(|cell| *cell.borrow_mut() = Some(dir));
  TestDirGuard
}
