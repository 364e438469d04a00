use super::backends::testing::ScriptedBackend;
use super::mspdi::SAMPLE_PROJECT;
use super::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn task(uid: &str, name: &str) -> ScheduleTask {
    ScheduleTask { unique_id: uid.to_string(), name: name.to_string(), ..Default::default() }
}

fn schedule_with(names: &[&str]) -> ScheduleData {
    ScheduleData {
        tasks: names.iter().enumerate().map(|(i, n)| task(&(i + 1).to_string(), n)).collect(),
        ..Default::default()
    }
}

fn mpp_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Shares a scripted backend with the test so call counts stay observable
struct Shared(Arc<ScriptedBackend>);

impl ScheduleBackend for Shared {
    fn kind(&self) -> BackendKind {
        self.0.kind()
    }

    fn probe(&self) -> bool {
        self.0.probe()
    }

    fn extract(&self, path: &Path) -> HandlerResult<ScheduleData> {
        self.0.extract(path)
    }
}

#[test]
fn test_fallback_uses_first_success() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", b"binary");

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![
            Box::new(ScriptedBackend::failing(BackendKind::Mpxj, "jvm crashed")),
            Box::new(ScriptedBackend::failing(BackendKind::ComAutomation, "no COM")),
            Box::new(ScriptedBackend::succeeding(BackendKind::XmlConversion, schedule_with(&["Go-Live"]))),
        ],
    );

    let extraction = handler.extract_data(&path).unwrap();
    assert_eq!(extraction.backend(), BackendKind::XmlConversion);
    assert_eq!(extraction.metadata.backend, BackendKind::XmlConversion);
    assert_eq!(extraction.metadata.file_size, 6);
    assert_eq!(extraction.data.tasks.len(), 1);
    assert_eq!(extraction.data.tasks[0].name, "Go-Live");
}

#[test]
fn test_unavailable_backends_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", b"binary");

    let skipped = Arc::new(ScriptedBackend::unavailable(BackendKind::Mpxj));
    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![
            Box::new(Shared(skipped.clone())),
            Box::new(ScriptedBackend::succeeding(BackendKind::ComAutomation, schedule_with(&["A"]))),
        ],
    );

    let extraction = handler.extract_data(&path).unwrap();
    assert_eq!(extraction.backend(), BackendKind::ComAutomation);
    assert_eq!(skipped.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_first_success_stops_the_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", b"binary");

    let later = Arc::new(ScriptedBackend::succeeding(BackendKind::XmlConversion, schedule_with(&["B"])));
    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![
            Box::new(ScriptedBackend::succeeding(BackendKind::Mpxj, schedule_with(&["A"]))),
            Box::new(Shared(later.clone())),
        ],
    );

    let extraction = handler.extract_data(&path).unwrap();
    assert_eq!(extraction.backend(), BackendKind::Mpxj);
    assert_eq!(later.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_all_backends_failed_reports_last_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", b"binary");

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![
            Box::new(ScriptedBackend::failing(BackendKind::Mpxj, "first")),
            Box::new(ScriptedBackend::failing(BackendKind::XmlConversion, "second")),
        ],
    );

    match handler.extract_data(&path) {
        Err(HandlerError::AllBackendsFailed { last, .. }) => {
            assert!(last.to_string().contains("second"));
            assert!(!last.to_string().contains("first"));
        }
        other => panic!("unexpected result: {:?}", other.map(|e| e.backend())),
    }
}

#[test]
fn test_no_backends() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", b"binary");

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![Box::new(ScriptedBackend::unavailable(BackendKind::Mpxj))],
    );
    assert!(!handler.capabilities().any());
    assert!(matches!(handler.extract_data(&path), Err(HandlerError::NoBackends)));
}

#[test]
fn test_capability_override() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", SAMPLE_PROJECT.as_bytes());

    let handler = ScheduleHandler::new(&ScheduleConfig::default())
        .with_capability(BackendCapability { xml_conversion: true, ..Default::default() });

    assert_eq!(handler.capabilities().available(), vec![BackendKind::XmlConversion]);
    let extraction = handler.extract_data(&path).unwrap();
    assert_eq!(extraction.backend(), BackendKind::XmlConversion);

    let disabled = ScheduleHandler::new(&ScheduleConfig::default())
        .with_capability(BackendCapability::default());
    assert!(matches!(disabled.extract_data(&path), Err(HandlerError::NoBackends)));
}

#[test]
fn test_missing_file() {
    let handler = ScheduleHandler::new(&ScheduleConfig::default());
    let result = handler.extract_data(Path::new("/no/such/plan.mpp"));
    assert!(matches!(result, Err(HandlerError::NotFound { .. })));
}

#[test]
fn test_can_handle_by_extension() {
    let handler = ScheduleHandler::with_backends(&ScheduleConfig::default(), Vec::new());
    assert!(handler.can_handle(Path::new("plan.mpp")));
    assert!(handler.can_handle(Path::new("PLAN.MPP")));
    assert!(!handler.can_handle(Path::new("plan.xml")));
}

#[test]
fn test_validate_missing_and_wrong_extension() {
    let temp_dir = TempDir::new().unwrap();
    let handler = ScheduleHandler::new(&ScheduleConfig::default());

    let report = handler.validate_structure(&temp_dir.path().join("missing.mpp"));
    assert!(!report.is_valid());
    assert!(report.errors[0].contains("does not exist"));

    let path = mpp_file(&temp_dir, "plan.xml", SAMPLE_PROJECT.as_bytes());
    let report = handler.validate_structure(&path);
    assert!(!report.is_valid());
    assert!(report.errors[0].contains(".mpp"));
}

#[test]
fn test_validate_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "empty.mpp", b"");

    let report = ScheduleHandler::new(&ScheduleConfig::default()).validate_structure(&path);
    assert_eq!(report.errors, vec!["File is empty".to_string()]);
}

#[test]
fn test_validate_small_readable_file_warns() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "tiny.mpp", b"binary");

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![Box::new(ScriptedBackend::succeeding(BackendKind::XmlConversion, ScheduleData::default()))],
    );
    let report = handler.validate_structure(&path);

    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("suspiciously small"));
    assert!(report.warnings[1].contains("No tasks"));
}

#[test]
fn test_validate_extraction_failure_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", &[0u8; 2048]);

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![Box::new(ScriptedBackend::failing(BackendKind::XmlConversion, "corrupt"))],
    );
    let report = handler.validate_structure(&path);

    assert!(!report.is_valid());
    assert!(report.warnings.is_empty());
    assert!(report.errors[0].contains("Cannot extract data"));
}

#[test]
fn test_validate_large_project_warns() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "big.mpp", &[0u8; 2048]);

    let config = ScheduleConfig { max_items: 2, ..ScheduleConfig::default() };
    let handler = ScheduleHandler::with_backends(
        &config,
        vec![Box::new(ScriptedBackend::succeeding(BackendKind::Mpxj, schedule_with(&["a", "b", "c"])))],
    );
    let report = handler.validate_structure(&path);

    assert!(report.is_valid());
    assert_eq!(report.warnings, vec!["Large project with 3 tasks".to_string()]);
}

#[test]
fn test_extract_timeline() {
    let temp_dir = TempDir::new().unwrap();
    let path = mpp_file(&temp_dir, "plan.mpp", SAMPLE_PROJECT.as_bytes());

    let handler = ScheduleHandler::with_backends(
        &ScheduleConfig::default(),
        vec![Box::new(XmlConversionBackend::new())],
    );
    let timeline = handler.extract_timeline(&path).unwrap();

    assert_eq!(timeline.project_name.as_deref(), Some("Website Relaunch"));
    assert_eq!(timeline.project_start, NaiveDate::from_ymd_opt(2025, 1, 6));

    let critical: Vec<_> = timeline.critical_path.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(critical, vec!["Build pages", "Go-Live"]);

    assert_eq!(timeline.dependencies.len(), 2);
    assert_eq!(timeline.dependencies[1].predecessor_uid, "2");
    assert_eq!(timeline.dependencies[1].successor_uid, "3");
    assert_eq!(timeline.dependencies[1].link_type, "SS");

    let assigned: Vec<_> =
        timeline.resource_assignments.iter().map(|a| a.resource_name.as_str()).collect();
    assert_eq!(assigned, vec!["Alice", "Bob"]);
}
