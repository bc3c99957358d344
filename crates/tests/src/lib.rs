//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件 -> SessionConfig -> tee 运行
//! - 真实磁盘文件 + 内存控制台
//! - 从引擎外部验证屏障、关闭与停止行为

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::TeeSettings;

    #[test]
    fn test_default_settings_survive_toml() {
        let toml = ConfigLoader::to_toml(&TeeSettings::default()).unwrap();
        let parsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed, TeeSettings::default());
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let result = ConfigLoader::load_from_str("apend = true", ConfigFormat::Toml);
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use fanout::testing::{MemoryWriter, PendingSource, ScriptedSource};
    use fanout::{run_with, ReaderLineSource, SessionConfig, StopSignal, TeeError};
    use tempfile::tempdir;

    fn no_signals(_: StopSignal) -> Result<(), TeeError> {
        Ok(())
    }

    /// Settings file -> SessionConfig -> run, appending to existing files
    #[tokio::test]
    async fn test_settings_driven_append_run() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        let fresh = dir.path().join("fresh.log");
        std::fs::write(&log, "old\n").unwrap();

        let settings = ConfigLoader::load_from_str(
            "append = true\nfile_buffer_size = 16\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let config = SessionConfig::from_settings(vec![log.clone(), fresh.clone()], &settings);
        let console = MemoryWriter::new();

        let stats = run_with(
            &config,
            ScriptedSource::new(["a", "b"]),
            console.clone(),
            no_signals,
        )
        .await
        .unwrap();

        assert_eq!(stats.lines, 2);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "old\na\nb\n");
        assert_eq!(std::fs::read_to_string(&fresh).unwrap(), "a\nb\n");
        assert_eq!(console.contents_string(), "a\nb\n");
        assert_eq!(console.shutdowns(), 1);
    }

    /// Raw bytes in, one `\n`-terminated line per input line out
    #[tokio::test]
    async fn test_byte_stream_replicated() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = SessionConfig::new(vec![out.clone()], false);
        let console = MemoryWriter::new();

        let input: &[u8] = b"first\r\n\nsecond\nno newline";
        run_with(&config, ReaderLineSource::new(input), console.clone(), no_signals)
            .await
            .unwrap();

        let expected = "first\n\nsecond\nno newline\n";
        assert_eq!(std::fs::read_to_string(&out).unwrap(), expected);
        assert_eq!(console.contents_string(), expected);
    }

    #[tokio::test]
    async fn test_long_line_not_truncated() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = SessionConfig::new(vec![out.clone()], false);

        let mut input = vec![b'x'; 200_000];
        input.push(b'\n');
        run_with(
            &config,
            ReaderLineSource::new(&input[..]),
            MemoryWriter::new(),
            no_signals,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), input);
    }

    /// A bad destination leaves good ones created but untouched, console unused
    #[tokio::test]
    async fn test_unopenable_destination() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.log");
        let bad = dir.path().join("no/such/dir/bad.log");
        let config = SessionConfig::new(vec![good.clone(), bad], false);
        let console = MemoryWriter::new();
        let source = ScriptedSource::new(["x"]);
        let reads = source.read_counter();

        let err = run_with(&config, source, console.clone(), no_signals)
            .await
            .unwrap_err();

        assert!(matches!(err, TeeError::Open { .. }), "got: {err:?}");
        assert!(err.to_string().contains("bad.log"), "got: {err}");
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_to_string(&good).unwrap(), "");
        assert_eq!(console.writes(), 0);
        assert_eq!(console.shutdowns(), 0);
    }

    /// The next line is only read after the slow console took the previous one
    #[tokio::test]
    async fn test_slow_sink_holds_back_input() {
        let dir = tempdir().unwrap();
        let config = SessionConfig::new(vec![dir.path().join("out")], false);
        let console = MemoryWriter::new().with_delay(Duration::from_millis(20));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let source = {
            let console = console.clone();
            let observed = Arc::clone(&observed);
            ScriptedSource::new(["line one", "line two", "line three"]).on_read(move |_| {
                observed.lock().unwrap().push(console.writes());
            })
        };

        run_with(&config, source, console.clone(), no_signals)
            .await
            .unwrap();

        assert_eq!(*observed.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    /// Write failure on the second line: first line everywhere, all sinks closed
    #[tokio::test]
    async fn test_console_failure_on_second_line() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = SessionConfig::new(vec![out.clone()], false);
        let console = MemoryWriter::new().fail_writes_after(1);
        let source = ScriptedSource::new(["line one", "line two", "line three"]);
        let reads = source.read_counter();

        let err = run_with(&config, source, console.clone(), no_signals)
            .await
            .unwrap_err();

        assert!(matches!(err, TeeError::Write { .. }), "got: {err:?}");
        assert_eq!(err.sink(), Some("<stdout>"));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(console.contents_string(), "line one\n");
        assert_eq!(console.shutdowns(), 1);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "line one\nline two\n"
        );
    }

    /// A stop while waiting for input ends the run cleanly
    #[tokio::test]
    async fn test_stop_while_input_blocked() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = SessionConfig::new(vec![out.clone()], false);
        let console = MemoryWriter::new();

        let listener = |stop: StopSignal| -> Result<(), TeeError> {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                stop.trigger();
            });
            Ok(())
        };

        let stats = tokio::time::timeout(
            Duration::from_secs(5),
            run_with(&config, PendingSource, console.clone(), listener),
        )
        .await
        .expect("stop ends the run")
        .unwrap();

        assert!(stats.stopped);
        assert_eq!(stats.lines, 0);
        assert_eq!(console.shutdowns(), 1);
        assert!(out.exists());
    }
}
