//! Speech through the platform's text-to-speech program.
//!
//! | Platform | Program      | Rate flag |
//! |----------|--------------|-----------|
//! | Linux    | `espeak-ng`  | `-s <wpm>` |
//! | macOS    | `say`        | `-r <wpm>` |
//! | Windows  | `powershell` | `System.Speech` `Rate` |
//!
//! Each utterance runs in its own child process on a detached thread, so
//! overlapping prompts may talk over each other.

use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use super::{SpeechEvent, Speaker};
use crate::config::SpeechConfig;

#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    rate: Option<u32>,
    events: Option<mpsc::Sender<SpeechEvent>>,
}

fn default_program() -> &'static str {
    if cfg!(target_os = "windows") {
        "powershell"
    } else if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak-ng"
    }
}

/// Map words per minute onto System.Speech's -10..=10 scale (0 ≈ 180 wpm).
fn sapi_rate(wpm: u32) -> i32 {
    ((wpm as i32 - 180) / 20).clamp(-10, 10)
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, rate: Option<u32>) -> Self {
        Self {
            program: program.into(),
            rate,
            events: None,
        }
    }

    pub fn from_config(speech: &SpeechConfig) -> Self {
        let program = speech
            .command
            .clone()
            .unwrap_or_else(|| default_program().to_string());
        Self::new(program, speech.rate)
    }

    pub fn with_events(mut self, tx: mpsc::Sender<SpeechEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments that make the program speak `text`.
    pub fn args(&self, text: &str) -> Vec<String> {
        let name = std::path::Path::new(&self.program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.program)
            .to_ascii_lowercase();

        let mut args = Vec::new();
        match name.as_str() {
            "powershell" | "pwsh" => {
                let rate = self.rate.map(sapi_rate).unwrap_or(0);
                let quoted = text.replace('\'', "''");
                args.push("-NoProfile".into());
                args.push("-Command".into());
                args.push(format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     $s.Rate = {rate}; $s.Speak('{quoted}')"
                ));
            }
            "say" => {
                if let Some(wpm) = self.rate {
                    args.extend(["-r".into(), wpm.to_string()]);
                }
                args.push(text.into());
            }
            "espeak" | "espeak-ng" => {
                if let Some(wpm) = self.rate {
                    args.extend(["-s".into(), wpm.to_string()]);
                }
                args.push(text.into());
            }
            _ => args.push(text.into()),
        }
        args
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        let text = text.to_string();
        let program = self.program.clone();
        let args = self.args(&text);
        let events = self.events.clone();

        let spawned = thread::Builder::new()
            .name("tts".into())
            .spawn(move || {
                let notify = |event: SpeechEvent| {
                    if let Some(tx) = &events {
                        let _ = tx.send(event);
                    }
                };
                notify(SpeechEvent::Started(text.clone()));
                let status = Command::new(&program)
                    .args(&args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
                match status {
                    Ok(s) if s.success() => notify(SpeechEvent::Finished(text)),
                    Ok(s) => {
                        log::debug!("{program} exited with {s}");
                        notify(SpeechEvent::Failed {
                            text,
                            reason: s.to_string(),
                        });
                    }
                    Err(e) => {
                        log::debug!("could not run {program}: {e}");
                        notify(SpeechEvent::Failed {
                            text,
                            reason: e.to_string(),
                        });
                    }
                }
            });

        if let Err(e) = spawned {
            log::debug!("could not start speech thread: {e}");
        }
    }
}
