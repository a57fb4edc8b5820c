//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 真实文件/fifo/管道/子进程上的 e2e 测试
//! - 吞吐基线

#[cfg(test)]
mod contract_tests {
    use contracts::{DestSpec, DestType, RexConfig};

    #[test]
    fn test_specifier_display_reparses() {
        let inputs = [
            "type=fd,id=1",
            "type=file,id=/var/log/out.log,perm=0600,create,append",
            "type=fifo,id=/tmp/live,bufsize=65536,nonblocking,create",
            "type=proc,id=gzip,args=-c -9",
        ];
        for input in inputs {
            let spec = dest::parse(input).unwrap();
            assert_eq!(spec.to_string(), input);
            assert_eq!(dest::parse(&spec.to_string()).unwrap(), spec);
        }
    }

    #[test]
    fn test_config_and_specifier_agree() {
        let json = r#"{
            "destinations": [
                { "type": "file", "id": "out.log", "perm": 384, "create": true }
            ]
        }"#;
        let config =
            dest::ConfigLoader::load_from_str(json, dest::ConfigFormat::Json).unwrap();

        let mut expected = DestSpec::new(DestType::File, "out.log");
        expected.perm = 0o600;
        expected.create = true;

        assert_eq!(config.destinations, vec![expected]);
        assert_eq!(config.buffer_size, RexConfig::default().buffer_size);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs::{self, File, OpenOptions};
    use std::io::{self, Read};
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::FromRawFd;
    use std::path::Path;

    use bytes::Bytes;
    use contracts::DestSpec;
    use fanout::{CancellationToken, FanOutWriter};
    use tempfile::tempdir;

    fn file_spec(path: &Path) -> DestSpec {
        dest::parse(&format!("type=file,id={},create", path.display())).unwrap()
    }

    fn writer_for(specs: &[DestSpec]) -> FanOutWriter {
        let sinks = dest::open_all(specs).unwrap();
        FanOutWriter::new(sinks, CancellationToken::new()).unwrap()
    }

    /// Returns (read end, write end fd number)
    ///
    /// Close-on-exec so process sinks spawned by other tests never hold the
    /// read end open.
    #[cfg(target_os = "linux")]
    fn pipe() -> (File, i32) {
        let mut fds = [0; 2];
        // SAFETY: `fds` has room for both descriptors.
        assert_eq!(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) }, 0);
        // SAFETY: the read end was just created and is owned by nobody else.
        (unsafe { File::from_raw_fd(fds[0]) }, fds[1])
    }

    #[cfg(target_os = "linux")]
    fn close_fd(fd: i32) {
        // SAFETY: `fd` is owned by the test and not used afterwards.
        unsafe { libc::close(fd) };
    }

    /// Every file sees the exact concatenation of the chunks
    #[tokio::test]
    async fn test_e2e_multiple_files() {
        let dir = tempdir().unwrap();
        let paths: Vec<_> = (0..4).map(|i| dir.path().join(format!("out{i}"))).collect();
        let specs: Vec<_> = paths.iter().map(|p| file_spec(p)).collect();

        let writer = writer_for(&specs);
        let mut expected = Vec::new();
        for i in 0..100u32 {
            let chunk = format!("chunk {i}\n").into_bytes();
            expected.extend_from_slice(&chunk);
            writer.write(Bytes::from(chunk)).await.unwrap();
        }

        let metrics = writer.metrics();
        writer.shutdown().await;

        for path in &paths {
            assert_eq!(fs::read(path).unwrap(), expected);
        }
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.chunk_count, 100);
            assert_eq!(snapshot.byte_count, expected.len() as u64);
        }
    }

    /// A full nonblocking fifo drops the overflow, the file beside it gets everything
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_e2e_nonblocking_fifo_beside_file() {
        let dir = tempdir().unwrap();
        let fifo_path = dir.path().join("live.fifo");
        let file_path = dir.path().join("archive");
        let bufsize = 16 * 1024;

        let fifo = dest::parse(&format!(
            "type=fifo,id={},create,nonblocking,bufsize={bufsize}",
            fifo_path.display()
        ))
        .unwrap();
        let writer = writer_for(&[fifo, file_spec(&file_path)]);

        let mut reader = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&fifo_path)
            .unwrap();

        let data: Vec<u8> = (0..256 * 1024).map(|i| (i % 199) as u8).collect();
        let n = writer.write(Bytes::from(data.clone())).await.unwrap();
        assert_eq!(n, data.len());
        assert!(writer.errors().is_empty());
        writer.shutdown().await;

        let mut received = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => panic!("read failed: {e}"),
            }
        }

        assert_eq!(received, &data[..bufsize]);
        assert_eq!(fs::read(&file_path).unwrap(), data);
    }

    /// A pipe without readers fails hard; the sibling file keeps receiving data
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_e2e_broken_pipe_isolated() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("survivor");

        let (read_end, write_fd) = pipe();
        let pipe_spec = dest::parse(&format!("type=fd,id={write_fd}")).unwrap();
        let writer = writer_for(&[pipe_spec, file_spec(&file_path)]);
        // The sink holds its own duplicate.
        close_fd(write_fd);

        writer.write(Bytes::from_static(b"first ")).await.unwrap();
        drop(read_end);

        let err = writer.write(Bytes::from_static(b"second")).await.unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EPIPE));

        // Later writes are rejected with the stored error without blocking.
        let again = writer.write(Bytes::from_static(b"third")).await.unwrap_err();
        assert_eq!(again.to_string(), err.to_string());

        writer.shutdown().await;
        assert_eq!(fs::read(&file_path).unwrap(), b"first second");
    }

    /// A write whose only sink hits a reader-less pipe always reports the failure
    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_broken_pipe_on_final_chunk() {
        for _ in 0..200 {
            let (read_end, write_fd) = pipe();
            let pipe_spec = dest::parse(&format!("type=fd,id={write_fd}")).unwrap();
            let writer = writer_for(&[pipe_spec]);
            close_fd(write_fd);
            drop(read_end);

            let err = writer.write(Bytes::from_static(b"x")).await.unwrap_err();
            assert_eq!(err.raw_os_error(), Some(libc::EPIPE));
            writer.shutdown().await;
        }
    }

    /// Process sinks receive the stream and have exited after shutdown
    #[tokio::test]
    async fn test_e2e_process_sinks() {
        let dir = tempdir().unwrap();
        let outs: Vec<_> = (0..2).map(|i| dir.path().join(format!("proc{i}"))).collect();
        let specs: Vec<_> = outs
            .iter()
            .map(|p| dest::parse(&format!("type=proc,id=sh,args=-c cat>{}", p.display())).unwrap())
            .collect();

        let writer = writer_for(&specs);
        for word in ["alpha ", "beta ", "gamma"] {
            writer.write(Bytes::from_static(word.as_bytes())).await.unwrap();
        }
        writer.shutdown().await;

        for out in &outs {
            assert_eq!(fs::read(out).unwrap(), b"alpha beta gamma");
        }
    }

    /// Rough throughput baseline: 64 MiB to three files
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_throughput_baseline() {
        let dir = tempdir().unwrap();
        let paths: Vec<_> = (0..3).map(|i| dir.path().join(format!("bulk{i}"))).collect();
        let specs: Vec<_> = paths.iter().map(|p| file_spec(p)).collect();
        let writer = writer_for(&specs);

        let chunk = Bytes::from(vec![0x5a; 64 * 1024]);
        let mut stats = observability::ThroughputAggregator::new();
        let started = std::time::Instant::now();
        for _ in 0..1024 {
            let t = std::time::Instant::now();
            let n = writer.write(chunk.clone()).await.unwrap();
            stats.update(n, t.elapsed());
        }
        let elapsed = started.elapsed();
        writer.shutdown().await;

        assert_eq!(stats.total_bytes, 64 * 1024 * 1024);
        assert!(stats.bytes_per_sec(elapsed) > 0.0);
        for path in &paths {
            assert_eq!(fs::metadata(path).unwrap().len(), 64 * 1024 * 1024);
        }
    }
}
