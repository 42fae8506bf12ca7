//! Tests for workspace preparation and finalization

#[cfg(test)]
mod prepare_tests {
    use super::super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn s(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    #[test]
    fn test_other_pack_type_is_configuration_error() {
        let pack: PackDescriptor =
            serde_json::from_value(json!({"type": "s3", "workdir": "/w"})).unwrap();
        let err = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("shared"));
    }

    #[test]
    fn test_shared_pack_without_workdir_is_configuration_error() {
        let pack: PackDescriptor = serde_json::from_value(json!({"type": "shared"})).unwrap();
        let err = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_no_tmpdir_is_noop() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("in.bam"), b"bam").unwrap();
        let args = json!({"bam": s(&temp.path().join("in.bam")), "n": 1});

        let pack = PackDescriptor::shared(temp.path());
        let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &args).unwrap();

        assert_eq!(prepared.workdir, temp.path());
        assert_eq!(prepared.args, args);
        assert!(prepared.finalizer.is_identity());
        assert_eq!(prepared.stats, StageStats::default());
    }

    #[test]
    fn test_workspace_named_with_prefix_under_tmpdir() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        let scratch = temp.path().join("scratch");
        std::fs::create_dir_all(&shared).unwrap();

        let config = StagingConfig {
            workdir_prefix: "ship".to_string(),
            ..Default::default()
        };
        let pack = PackDescriptor::shared(&shared).with_tmpdir(&scratch);
        let prepared =
            prepare_workdir_with(&config, &pack, &ParallelDescriptor::default(), &json!({}))
                .unwrap();

        assert_eq!(prepared.workdir.parent(), Some(scratch.as_path()));
        let name = prepared.workdir.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ship-"));
        assert!(Uuid::parse_str(&name["ship-".len()..]).is_ok());
        assert!(prepared.workdir.is_dir());
    }

    #[test]
    fn test_concurrent_preparations_get_distinct_workspaces() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        std::fs::create_dir_all(&shared).unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pack = pack.clone();
                std::thread::spawn(move || {
                    prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({}))
                        .unwrap()
                        .workdir
                })
            })
            .collect();
        let mut dirs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), 8);
    }

    #[test]
    fn test_prepare_datadir() {
        let pack = PackDescriptor::shared("/w").with_datadir("/genomes");
        assert_eq!(prepare_datadir(&pack).unwrap(), PathBuf::from("/genomes"));

        let err = prepare_datadir(&PackDescriptor::shared("/w")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_tmpdir_that_is_a_file_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        let scratch = temp.path().join("scratch");
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(&scratch, b"not a directory").unwrap();

        let pack = PackDescriptor::shared(&shared).with_tmpdir(&scratch);
        let err = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap_err();

        assert!(err.is_filesystem());
        assert!(err.to_string().contains(&s(&scratch)));
    }
}

#[cfg(test)]
mod finalizer_tests {
    use super::super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn s(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    #[test]
    fn test_identity_finalizer_returns_output_untouched() {
        let temp = TempDir::new().unwrap();
        let finalizer = Finalizer::identity(
            json!({}),
            temp.path().to_path_buf(),
            ParallelDescriptor::default(),
        );
        let output = json!({"vcf": "/somewhere/out.vcf"});
        assert_eq!(
            finalizer.finalize(Some(output.clone())).unwrap(),
            Some(output)
        );
        assert!(temp.path().exists());
    }

    #[test]
    fn test_finalize_without_output_still_removes_workspace() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));
        let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap();
        let workdir = prepared.workdir.clone();

        assert_eq!(prepared.finalizer.finalize(None).unwrap(), None);
        assert!(!workdir.exists());
    }

    #[test]
    fn test_finalize_null_output_returns_none() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));
        let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap();
        let workdir = prepared.workdir.clone();

        assert_eq!(prepared.finalizer.finalize(Some(Value::Null)).unwrap(), None);
        assert!(!workdir.exists());
    }

    #[test]
    fn test_finalize_tolerates_removed_workspace() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));
        let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &json!({})).unwrap();
        fs::remove_dir_all(&prepared.workdir).unwrap();

        assert!(prepared.finalizer.finalize(None).is_ok());
    }

    #[test]
    fn test_outputs_outside_declared_resources_still_ship_home() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));
        let parallel = ParallelDescriptor::with_resources([["align"]]);
        let prepared = prepare_workdir(&pack, &parallel, &json!({})).unwrap();

        let report = prepared.workdir.join("qc").join("report.html");
        fs::create_dir_all(report.parent().unwrap()).unwrap();
        fs::write(&report, b"<html>").unwrap();

        let shipped = prepared
            .finalizer
            .finalize(Some(json!({"qc": {"report": s(&report)}})))
            .unwrap()
            .unwrap();

        let home = shared.join("qc").join("report.html");
        assert_eq!(shipped["qc"]["report"], json!(s(&home)));
        assert_eq!(fs::read(&home).unwrap(), b"<html>");
    }

    #[test]
    fn test_handle_save_and_load() {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("in.bam"), b"bam").unwrap();
        let pack = PackDescriptor::shared(&shared).with_tmpdir(temp.path().join("scratch"));
        let args = json!({"bam": s(&shared.join("in.bam"))});
        let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &args).unwrap();

        let handle = temp.path().join("handle.json");
        prepared.finalizer.save(&handle).unwrap();
        let loaded = Finalizer::load(&handle).unwrap();

        assert_eq!(loaded, prepared.finalizer);
        assert_eq!(loaded.args(), &prepared.args);
        assert_eq!(loaded.workdir(), prepared.workdir.as_path());
        assert_eq!(loaded.remap().len(), 1);
    }
}
