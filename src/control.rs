//! Live show control: newline-delimited JSON over stdin or a watched file.
//! Each line is a partial update; absent fields leave the running show
//! untouched. Applied between frames by the main loop.

/// One control message. Every field optional.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ControlParams {
    /// "random" or "choreography"
    pub mode: Option<String>,
    /// Scripted show index to start
    pub show: Option<usize>,
    /// "high", "medium", "low"
    pub tier: Option<String>,
    /// Terminal bell on/off
    pub bell: Option<bool>,
    pub size: Option<f64>,
    pub count: Option<usize>,
    pub height: Option<f64>,
    pub spread: Option<f64>,
    pub speed: Option<f64>,
    pub delay: Option<f64>,
}

pub enum ControlSource {
    Stdin,
    File(std::path::PathBuf),
}

pub fn spawn_reader(source: ControlSource) -> std::sync::mpsc::Receiver<ControlParams> {
    let (tx, rx) = std::sync::mpsc::channel::<ControlParams>();

    match source {
        ControlSource::Stdin => {
            std::thread::spawn(move || {
                use std::io::BufRead;
                let stdin = std::io::BufReader::new(std::io::stdin());
                for line in stdin.lines() {
                    match line {
                        Ok(l) => {
                            if let Ok(params) = serde_json::from_str::<ControlParams>(&l)
                                && tx.send(params).is_err()
                            {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });
        }
        ControlSource::File(path) => {
            std::thread::spawn(move || {
                // Apply the last non-empty line once on startup, then watch.
                if let Ok(contents) = std::fs::read_to_string(&path)
                    && let Some(line) = contents.lines().rfind(|l| !l.trim().is_empty())
                    && let Ok(params) = serde_json::from_str::<ControlParams>(line)
                    && tx.send(params).is_err()
                {
                    return;
                }

                let (file_tx, file_rx) = std::sync::mpsc::channel();
                let Ok(mut watcher) = notify::recommended_watcher(move |res| {
                    let _ = file_tx.send(res);
                }) else {
                    return;
                };
                if notify::Watcher::watch(
                    &mut watcher,
                    &path,
                    notify::RecursiveMode::NonRecursive,
                )
                .is_err()
                {
                    return;
                }
                while let Ok(Ok(_event)) = file_rx.recv() {
                    if let Ok(contents) = std::fs::read_to_string(&path)
                        && let Some(line) = contents.lines().rfind(|l| !l.trim().is_empty())
                        && let Ok(params) = serde_json::from_str::<ControlParams>(line)
                        && tx.send(params).is_err()
                    {
                        break;
                    }
                }
            });
        }
    }

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_messages_leave_other_fields_none() {
        let params: ControlParams = serde_json::from_str(r#"{"speed": 1.5}"#).unwrap();
        assert_eq!(params.speed, Some(1.5));
        assert!(params.mode.is_none());
        assert!(params.count.is_none());
    }

    #[test]
    fn full_message_parses() {
        let params: ControlParams = serde_json::from_str(
            r#"{"mode":"choreography","show":1,"tier":"low","bell":true,
                "size":3,"count":50,"height":0.5,"spread":0.3,"speed":1.2,"delay":0.2}"#,
        )
        .unwrap();
        assert_eq!(params.mode.as_deref(), Some("choreography"));
        assert_eq!(params.show, Some(1));
        assert_eq!(params.tier.as_deref(), Some("low"));
        assert_eq!(params.bell, Some(true));
        assert_eq!(params.count, Some(50));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let params: ControlParams =
            serde_json::from_str(r#"{"speed": 0.8, "nonsense": 42}"#).unwrap();
        assert_eq!(params.speed, Some(0.8));
    }
}
