use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::actor::reactor::{self, Event as ReactorEvent};
use crate::common::config::Config;

/// Polls the configuration file and pushes every valid revision to the
/// reactor.
pub struct ConfigWatcher {
    file: PathBuf,
    events_tx: reactor::Sender,
}

impl ConfigWatcher {
    pub fn spawn(file: PathBuf, events_tx: reactor::Sender) {
        thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || {
                let actor = ConfigWatcher { file, events_tx };
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .expect("failed to build config-watcher runtime");
                runtime.block_on(async move {
                    if let Err(e) = actor.run().await {
                        warn!("config-watcher: error: {e:?}");
                    }
                })
            })
            .expect("failed to spawn config-watcher thread");
    }

    async fn run(self) -> notify::Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = PollWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            NotifyConfig::default()
                .with_poll_interval(Duration::from_secs(1))
                .with_compare_contents(true),
        )?;

        watcher.watch(&self.file, RecursiveMode::NonRecursive)?;

        info!("watching {:?}", self.file);

        loop {
            match rx.recv().await {
                Some(Ok(event)) => {
                    if self.is_relevant(&event) {
                        debug!("change detected: {:?}", event.kind);
                        if let Some(config) = self.reload() {
                            self.events_tx.send(ReactorEvent::ConfigUpdated(config));
                        }
                    } else {
                        debug!("ignoring unrelated event: {:?}", event.kind);
                    }
                }
                Some(Err(e)) => {
                    warn!("watch error: {e:?}");
                }
                None => {
                    warn!("channel closed, exiting");
                    break;
                }
            }
            if self.events_tx.is_closed() {
                info!("reactor is gone, exiting");
                break;
            }
        }

        Ok(())
    }

    fn is_relevant(&self, event: &Event) -> bool {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => event
                .paths
                .iter()
                .any(|p| p == &self.file || p.file_name() == self.file.file_name()),
            _ => false,
        }
    }

    /// Reads and validates the file. Broken or invalid revisions are logged
    /// and skipped; the reactor keeps the configuration it has.
    fn reload(&self) -> Option<Config> {
        let config = match Config::read(&self.file) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring unreadable config: {e:#}");
                return None;
            }
        };
        let issues = config.validate();
        if !issues.is_empty() {
            for issue in &issues {
                warn!("config: {issue}");
            }
            warn!("ignoring config with {} issue(s)", issues.len());
            return None;
        }
        info!("config reloaded");
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_log::test;

    use super::*;

    fn watcher(dir: &TempDir) -> ConfigWatcher {
        let (events_tx, _rx) = crate::actor::channel();
        ConfigWatcher {
            file: dir.path().join("config.toml"),
            events_tx,
        }
    }

    #[test]
    fn only_changes_to_the_config_file_are_relevant() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher(&dir);
        let event = |kind, path: PathBuf| Event::new(kind).add_path(path);

        assert!(watcher.is_relevant(&event(
            EventKind::Modify(ModifyKind::Any),
            watcher.file.clone()
        )));
        assert!(watcher.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            watcher.file.clone()
        )));
        assert!(!watcher.is_relevant(&event(
            EventKind::Remove(RemoveKind::File),
            watcher.file.clone()
        )));
        assert!(!watcher.is_relevant(&event(
            EventKind::Modify(ModifyKind::Any),
            dir.path().join("other.toml")
        )));
    }

    #[test]
    fn reload_skips_broken_and_invalid_files() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher(&dir);
        assert_eq!(watcher.reload(), None);

        std::fs::write(&watcher.file, "[layout]\ncard_width = \"wide\"\n").unwrap();
        assert_eq!(watcher.reload(), None);

        std::fs::write(&watcher.file, "[layout]\ncard_width = -5\n").unwrap();
        assert_eq!(watcher.reload(), None);

        std::fs::write(&watcher.file, "[layout]\ncard_width = 400\n").unwrap();
        let config = watcher.reload().unwrap();
        assert_eq!(config.layout.card_width, 400);
    }
}
