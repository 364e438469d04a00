//! Schedule-file backends
//!
//! Each backend is one strategy for turning a binary `.mpp` file into
//! [`ScheduleData`]. They all go through an MSPDI XML rendition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::mspdi::{ScheduleData, parse_mspdi};
use crate::config::ScheduleConfig;
use crate::error::{HandlerError, HandlerResult};

/// Identifies a backend, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Mpxj,
    ComAutomation,
    XmlConversion,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Mpxj, Self::ComAutomation, Self::XmlConversion];
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpxj => write!(f, "MPXJ"),
            Self::ComAutomation => write!(f, "COM Automation"),
            Self::XmlConversion => write!(f, "XML Conversion"),
        }
    }
}

/// One strategy for reading a schedule file
pub trait ScheduleBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Cheap availability check, run once when the handler is built
    fn probe(&self) -> bool;

    fn extract(&self, path: &Path) -> HandlerResult<ScheduleData>;
}

/// Default backend chain for a configuration
pub fn default_backends(config: &ScheduleConfig) -> Vec<Box<dyn ScheduleBackend>> {
    vec![
        Box::new(MpxjBackend::new(config)),
        Box::new(ComAutomationBackend::new(config)),
        Box::new(XmlConversionBackend::new()),
    ]
}

/// Runs the MPXJ converter on a JVM
#[derive(Debug, Clone)]
pub struct MpxjBackend {
    java_command: String,
    classpath: Option<String>,
    main_class: String,
}

impl MpxjBackend {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            java_command: config.java_command.clone(),
            classpath: config.resolved_classpath(),
            main_class: config.mpxj_main_class.clone(),
        }
    }
}

impl ScheduleBackend for MpxjBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mpxj
    }

    fn probe(&self) -> bool {
        if self.classpath.is_none() {
            return false;
        }
        Command::new(&self.java_command)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn extract(&self, path: &Path) -> HandlerResult<ScheduleData> {
        let classpath = self
            .classpath
            .as_deref()
            .ok_or_else(|| HandlerError::backend(self.kind().to_string(), "no MPXJ classpath configured"))?;

        let temp_dir = tempfile::tempdir()?;
        let output_path = temp_dir.path().join("export.xml");

        debug!("Converting {} with {}", path.display(), self.main_class);
        let output = Command::new(&self.java_command)
            .arg("-cp")
            .arg(classpath)
            .arg(&self.main_class)
            .arg(path)
            .arg(&output_path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandlerError::backend(
                self.kind().to_string(),
                format!("converter exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let xml = fs::read_to_string(&output_path)?;
        parse_mspdi(&xml)
    }
}

/// Drives Microsoft Project through COM (Windows only)
#[derive(Debug, Clone)]
pub struct ComAutomationBackend {
    powershell_command: String,
}

impl ComAutomationBackend {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self { powershell_command: config.powershell_command.clone() }
    }

    fn run_script(&self, script: &str) -> std::io::Result<std::process::Output> {
        Command::new(&self.powershell_command)
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()
    }
}

impl ScheduleBackend for ComAutomationBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ComAutomation
    }

    fn probe(&self) -> bool {
        if !cfg!(windows) {
            return false;
        }
        self.run_script("[type]::GetTypeFromProgID('MSProject.Application') -ne $null")
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    fn extract(&self, path: &Path) -> HandlerResult<ScheduleData> {
        if !cfg!(windows) {
            return Err(HandlerError::backend(self.kind().to_string(), "only available on Windows"));
        }

        let input = fs::canonicalize(path)?;
        let temp_dir = tempfile::tempdir()?;
        let output_path = temp_dir.path().join("export.xml");

        let output = self.run_script(&save_as_xml_script(&input, &output_path))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandlerError::backend(self.kind().to_string(), stderr.trim().to_string()));
        }

        let xml = fs::read_to_string(&output_path)?;
        parse_mspdi(&xml)
    }
}

fn save_as_xml_script(input: &Path, output: &Path) -> String {
    let quote = |p: &Path| p.display().to_string().replace('\'', "''");
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         $app = New-Object -ComObject MSProject.Application\n\
         $app.Visible = $false\n\
         $app.DisplayAlerts = $false\n\
         try {{\n\
             $app.FileOpenEx('{input}', $true) | Out-Null\n\
             $m = [Type]::Missing\n\
             $app.FileSaveAs('{output}', $m, $m, $m, $m, $m, $m, $m, $m, 'MSProject.XML') | Out-Null\n\
             $app.FileCloseEx(0) | Out-Null\n\
         }} finally {{ $app.Quit(0) }}",
        input = quote(input),
        output = quote(output),
    )
}

/// Reads an MSPDI XML export: the file itself, or a sibling `<stem>.xml`
#[derive(Debug, Clone, Default)]
pub struct XmlConversionBackend;

impl XmlConversionBackend {
    pub fn new() -> Self {
        Self
    }

    fn xml_source(&self, path: &Path) -> HandlerResult<(PathBuf, String)> {
        let bytes = fs::read(path)?;
        if looks_like_xml(&bytes) {
            return Ok((path.to_path_buf(), String::from_utf8_lossy(&bytes).into_owned()));
        }

        let sibling = path.with_extension("xml");
        if sibling.exists() {
            let xml = fs::read_to_string(&sibling)?;
            return Ok((sibling, xml));
        }

        Err(HandlerError::backend(
            self.kind().to_string(),
            format!("no XML export found; save the project as {}", sibling.display()),
        ))
    }
}

impl ScheduleBackend for XmlConversionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::XmlConversion
    }

    fn probe(&self) -> bool {
        true
    }

    fn extract(&self, path: &Path) -> HandlerResult<ScheduleData> {
        let (source, xml) = self.xml_source(path)?;
        debug!("Reading MSPDI XML from {}", source.display());
        parse_mspdi(&xml)
    }
}

fn looks_like_xml(bytes: &[u8]) -> bool {
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    text.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<')
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend with a fixed probe result and a fixed outcome
    pub struct ScriptedBackend {
        pub kind: BackendKind,
        pub available: bool,
        pub outcome: Result<ScheduleData, String>,
        pub calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn succeeding(kind: BackendKind, data: ScheduleData) -> Self {
            Self { kind, available: true, outcome: Ok(data), calls: AtomicUsize::new(0) }
        }

        pub fn failing(kind: BackendKind, message: &str) -> Self {
            Self { kind, available: true, outcome: Err(message.to_string()), calls: AtomicUsize::new(0) }
        }

        pub fn unavailable(kind: BackendKind) -> Self {
            Self {
                kind,
                available: false,
                outcome: Err("not installed".to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScheduleBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn probe(&self) -> bool {
            self.available
        }

        fn extract(&self, _path: &Path) -> HandlerResult<ScheduleData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .map_err(|message| HandlerError::backend(self.kind.to_string(), message))
        }
    }
}
