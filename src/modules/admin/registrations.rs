//! Append-only log of user registrations, one `{id},{name}` line per user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const REGISTERED_MESSAGE: &str = "User registered successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub name: String,
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("{}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("registration log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// File-backed registration log. Appends are serialized through an internal lock.
///
/// The lock covers one process. Each registration is a single append of one short line,
/// so writers in other processes interleave whole lines.
#[derive(Debug)]
pub struct RegistrationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RegistrationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and append one registration.
    pub async fn register(&self, name: &str, id: &str) -> Result<Registration, RegistrationError> {
        let registration = validate(name, id)?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let line = format!("{},{}\n", registration.id, registration.name);
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(
            id = %registration.id,
            path = %self.path.display(),
            "user registered"
        );
        Ok(registration)
    }

    /// Every registration in file order. A missing log means nobody registered yet.
    pub async fn list(&self) -> Result<Vec<Registration>, RegistrationError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_line)
            .collect())
    }
}

fn validate(name: &str, id: &str) -> Result<Registration, RegistrationError> {
    let name = name.trim();
    let id = id.trim();
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("Name is required.".to_string());
    } else if name.contains(['\n', '\r']) {
        errors.push("Name must be a single line.".to_string());
    }
    if id.is_empty() {
        errors.push("ID is required.".to_string());
    } else if id.contains(['\n', '\r']) {
        errors.push("ID must be a single line.".to_string());
    } else if id.contains(',') {
        errors.push("ID must not contain a comma.".to_string());
    }

    if !errors.is_empty() {
        return Err(RegistrationError::Validation(errors));
    }

    Ok(Registration {
        id: id.to_string(),
        name: name.to_string(),
    })
}

/// Split on the first comma; the name keeps any later commas.
fn parse_line(line: &str) -> Registration {
    match line.split_once(',') {
        Some((id, name)) => Registration {
            id: id.to_string(),
            name: name.to_string(),
        },
        None => Registration {
            id: line.to_string(),
            name: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn log_in(dir: &TempDir) -> RegistrationLog {
        RegistrationLog::new(dir.path().join("admin").join("users.txt"))
    }

    #[tokio::test]
    async fn missing_log_lists_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(log_in(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_appends_id_then_name() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        log.register("  Ada Lovelace ", " 42 ").await.unwrap();
        log.register("Grace Hopper", "7").await.unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw, "42,Ada Lovelace\n7,Grace Hopper\n");

        let listed = log.list().await.unwrap();
        assert_eq!(
            listed,
            vec![
                Registration {
                    id: "42".to_string(),
                    name: "Ada Lovelace".to_string()
                },
                Registration {
                    id: "7".to_string(),
                    name: "Grace Hopper".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_without_writing() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        let err = log.register(" ", "").await.unwrap_err();
        match err {
            RegistrationError::Validation(errors) => {
                assert_eq!(errors, vec!["Name is required.", "ID is required."])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(!log.path().exists());
    }

    #[tokio::test]
    async fn multi_line_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        assert!(matches!(
            log.register("Ada\n99,Mallory", "1").await,
            Err(RegistrationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn commas_in_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        match log.register("Ada", "1,2").await {
            Err(RegistrationError::Validation(errors)) => {
                assert_eq!(errors, vec!["ID must not contain a comma."])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(!log.path().exists());

        log.register("Smith, John", "3").await.unwrap();
        assert_eq!(log.list().await.unwrap()[0].name, "Smith, John");
    }

    #[tokio::test]
    async fn list_splits_on_first_comma_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        std::fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        std::fs::write(log.path(), "1,Smith, John\n\n2\n").unwrap();

        let listed = log.list().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Smith, John");
        assert_eq!(listed[1].id, "2");
        assert_eq!(listed[1].name, "");
    }

    #[tokio::test]
    async fn concurrent_registrations_all_land() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(log_in(&dir));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.register(&format!("User {}", i), &i.to_string()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(log.list().await.unwrap().len(), 16);
    }
}
