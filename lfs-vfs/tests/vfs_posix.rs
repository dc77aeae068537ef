//! POSIX-shaped entry points against a mounted in-memory engine.

#![cfg_attr(feature = "readonly", allow(unused_imports))]

mod common;

use std::collections::HashSet;
use std::sync::{Arc, MutexGuard};

use common::{
    serial, set_engine_faults, small_card, BlockingRawMutex, EngineFaults, MemEngine, MockCard, SLOT,
};
use embedded_io::{Read, Seek, SeekFrom, Write};
use lfs_vfs::{
    mount, mount_with_raw_mutex, Descriptor, Errno, FileStream, Mount, MountFlags, OpenFlags,
    PathRouter, VfsAdapter, VfsBackend, MAX_FILES,
};

/// A formatted, mounted card. Fields drop in order: the mount goes before the lock.
struct Fixture {
    mount: Mount<MemEngine, MockCard>,
    router: Arc<PathRouter>,
    _serial: MutexGuard<'static, ()>,
}

impl Fixture {
    fn new() -> Self {
        let serial = serial();
        set_engine_faults(EngineFaults::default());
        let router = Arc::new(PathRouter::new());
        let mount = mount::<MemEngine, _>("/sd", small_card(), &SLOT, MountFlags::FORMAT, router.clone())
            .expect("mount");
        Self {
            mount,
            router,
            _serial: serial,
        }
    }

    fn vfs(&self) -> &VfsAdapter<MemEngine> {
        self.mount.backend()
    }
}

fn rw_create() -> OpenFlags {
    OpenFlags::RDWR | OpenFlags::CREAT
}

#[test]
fn descriptors_are_unique_until_the_table_is_full() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    let mut seen = HashSet::new();
    for i in 0..MAX_FILES {
        let fd = vfs.open(&format!("/f{i}"), rw_create(), 0o644).unwrap();
        assert!(fd.raw() > 2, "{fd} collides with a standard stream");
        assert_ne!(fd, Descriptor::INVALID);
        assert!(seen.insert(fd), "{fd} handed out twice");
    }
    assert_eq!(vfs.open("/one-more", rw_create(), 0), Err(Errno::TooManyOpenFiles));
    assert_eq!(vfs.stat("/one-more"), Err(Errno::NoEntry));

    for fd in seen {
        vfs.close(fd).unwrap();
    }
    assert_eq!(vfs.open_files(), 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn closed_descriptor_no_longer_resolves() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    let fd = vfs.open("/a", rw_create(), 0).unwrap();
    vfs.close(fd).unwrap();

    assert_eq!(vfs.read(fd, &mut [0u8; 8]), Err(Errno::BadDescriptor));
    assert_eq!(vfs.write(fd, b"x"), Err(Errno::BadDescriptor));
    assert_eq!(vfs.lseek(fd, 0, 0), Err(Errno::BadDescriptor));
    assert_eq!(vfs.fsync(fd), Err(Errno::BadDescriptor));
    assert_eq!(vfs.close(fd), Err(Errno::BadDescriptor));
}

#[cfg(not(feature = "readonly"))]
#[test]
fn write_seek_read_round_trip_across_blocks() {
    let fx = Fixture::new();
    let vfs = fx.vfs();
    let block = fx.mount.geometry().block_size() as usize;

    let fd = vfs.open("/data.bin", rw_create(), 0).unwrap();
    let base: Vec<u8> = (0..3 * block).map(|i| (i % 253) as u8).collect();
    assert_eq!(vfs.write(fd, &base).unwrap(), base.len());

    for (offset, len) in [(block - 100, 200), (block - 1, block + 2), (0, 3 * block)] {
        let patch: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
        assert_eq!(vfs.lseek(fd, offset as i64, 0).unwrap(), offset as u64);
        vfs.write(fd, &patch).unwrap();

        assert_eq!(vfs.lseek(fd, offset as i64, 0).unwrap(), offset as u64);
        let mut back = vec![0u8; len];
        assert_eq!(vfs.read(fd, &mut back).unwrap(), len);
        assert_eq!(back, patch, "offset {offset} len {len}");
    }

    assert_eq!(vfs.lseek(fd, 0, 2).unwrap(), 3 * block as u64);
    assert_eq!(vfs.read(fd, &mut [0u8; 4]).unwrap(), 0);
    vfs.close(fd).unwrap();
}

#[cfg(not(feature = "readonly"))]
#[test]
fn open_flag_semantics() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    assert_eq!(vfs.open("/none", OpenFlags::RDONLY, 0), Err(Errno::NoEntry));

    let fd = vfs.open("/log", OpenFlags::WRONLY | OpenFlags::CREAT, 0).unwrap();
    vfs.write(fd, b"first").unwrap();
    assert_eq!(vfs.read(fd, &mut [0u8; 4]), Err(Errno::BadDescriptor));
    vfs.close(fd).unwrap();

    let excl = OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::EXCL;
    assert_eq!(vfs.open("/log", excl, 0), Err(Errno::Exists));

    let fd = vfs.open("/log", OpenFlags::WRONLY | OpenFlags::APPEND, 0).unwrap();
    vfs.write(fd, b"+second").unwrap();
    vfs.close(fd).unwrap();
    assert_eq!(vfs.stat("/log").unwrap().size, 12);

    let fd = vfs.open("/log", OpenFlags::RDWR | OpenFlags::TRUNC, 0).unwrap();
    assert_eq!(vfs.stat("/log").unwrap().size, 0);
    vfs.close(fd).unwrap();

    assert_eq!(
        vfs.open("/log", OpenFlags::from_bits_retain(3), 0),
        Err(Errno::InvalidArgument)
    );
}

#[cfg(not(feature = "readonly"))]
#[test]
fn engine_errors_reach_the_caller_translated() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    vfs.mkdir("/dir", 0o755).unwrap();
    assert_eq!(vfs.mkdir("/dir", 0o755), Err(Errno::Exists));
    assert_eq!(vfs.open("/dir", OpenFlags::RDONLY, 0), Err(Errno::IsADirectory));
    assert_eq!(vfs.opendir("/missing").err(), Some(Errno::NoEntry));

    let fd = vfs.open("/dir/file", rw_create(), 0).unwrap();
    vfs.close(fd).unwrap();
    assert_eq!(vfs.open("/dir/file/x", rw_create(), 0), Err(Errno::NotADirectory));
    assert_eq!(vfs.opendir("/dir/file").err(), Some(Errno::NotADirectory));
    assert_eq!(vfs.rmdir("/dir"), Err(Errno::DirectoryNotEmpty));

    let long = format!("/{}", "n".repeat(256));
    assert_eq!(vfs.open(&long, rw_create(), 0), Err(Errno::NameTooLong));

    vfs.unlink("/dir/file").unwrap();
    assert_eq!(vfs.unlink("/dir/file"), Err(Errno::NoEntry));
    vfs.rmdir("/dir").unwrap();
    assert_eq!(vfs.stat("/dir"), Err(Errno::NoEntry));
}

#[cfg(not(feature = "readonly"))]
#[test]
fn filling_the_card_reports_no_space() {
    let fx = Fixture::new();
    let vfs = fx.vfs();
    let total = fx.mount.geometry().total_size() as usize;

    let fd = vfs.open("/big", rw_create(), 0).unwrap();
    let chunk = vec![0x5A; 16 * 1024];
    let mut written = 0;
    let err = loop {
        match vfs.write(fd, &chunk) {
            Ok(n) => written += n,
            Err(err) => break err,
        }
        assert!(written <= total, "wrote past the card");
    };
    assert_eq!(err, Errno::NoSpace);
    vfs.close(fd).unwrap();
}

#[cfg(not(feature = "readonly"))]
#[test]
fn stat_synthesizes_posix_status() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    let fd = vfs.open("/s.txt", rw_create(), 0).unwrap();
    vfs.write(fd, &[0u8; 1234]).unwrap();
    vfs.close(fd).unwrap();
    vfs.mkdir("/sub", 0).unwrap();

    let st = vfs.stat("/s.txt").unwrap();
    assert!(st.is_file());
    assert_eq!((st.ino, st.nlink, st.size), (123, 1, 1234));
    assert_eq!(st.mode & 0o777, 0o777);

    let st = vfs.stat("/sub").unwrap();
    assert!(st.is_dir());
    assert_eq!(st.size, 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn empty_directory_ends_immediately() {
    let fx = Fixture::new();
    let vfs = fx.vfs();
    vfs.mkdir("/empty", 0).unwrap();

    let mut dir = vfs.opendir("/empty").unwrap();
    assert!(vfs.readdir(dir.as_mut()).unwrap().is_none());
    vfs.closedir(dir).unwrap();
    assert_eq!(fx.mount.engine().open_dirs.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn directory_iteration_yields_each_entry_once() {
    let fx = Fixture::new();
    let vfs = fx.vfs();

    vfs.mkdir("/d", 0).unwrap();
    vfs.mkdir("/d/nested", 0).unwrap();
    let longest = "x".repeat(255);
    for name in ["a.txt", "b.txt", longest.as_str()] {
        let fd = vfs.open(&format!("/d/{name}"), rw_create(), 0).unwrap();
        vfs.close(fd).unwrap();
    }

    let mut dir = vfs.opendir("/d").unwrap();
    let mut names = Vec::new();
    while let Some(entry) = vfs.readdir(dir.as_mut()).unwrap() {
        assert_eq!(entry.raw_name()[entry.name_bytes().len()], 0);
        names.push((entry.name().to_string(), entry.d_type()));
    }
    assert!(vfs.readdir(dir.as_mut()).unwrap().is_none());
    vfs.closedir(dir).unwrap();

    assert_eq!(names.len(), 4);
    assert!(names.contains(&("a.txt".to_string(), 1)));
    assert!(names.contains(&("nested".to_string(), 2)));
    assert!(names.contains(&(longest, 1)));
}

#[test]
fn dropped_directory_stream_releases_cursor() {
    let fx = Fixture::new();
    let vfs = fx.vfs();
    let open_dirs = || fx.mount.engine().open_dirs.load(std::sync::atomic::Ordering::SeqCst);

    let dir = vfs.opendir("/").unwrap();
    assert_eq!(open_dirs(), 1);
    drop(dir);
    assert_eq!(open_dirs(), 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn router_strips_mount_point() {
    let fx = Fixture::new();

    let (vfs, path) = fx.router.resolve("/sd/hello.txt").unwrap();
    assert_eq!(path, "/hello.txt");
    let fd = vfs.open(path, rw_create(), 0).unwrap();
    vfs.write(fd, b"hi").unwrap();
    vfs.close(fd).unwrap();

    assert_eq!(fx.vfs().stat("/hello.txt").unwrap().size, 2);
    assert!(fx.router.resolve("/sdx/hello.txt").is_none());
}

#[cfg(not(feature = "readonly"))]
#[test]
fn file_stream_speaks_embedded_io() {
    let fx = Fixture::new();
    let backend: Arc<dyn VfsBackend> = fx.mount.backend().clone();

    let mut file = FileStream::open(backend.clone(), "/stream.txt", rw_create()).unwrap();
    file.write_all(b"line one\nline two\n").unwrap();
    file.flush().unwrap();
    file.seek(SeekFrom::Start(9)).unwrap();

    let mut buf = [0u8; 8];
    file.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"line two");
    file.close().unwrap();

    assert_eq!(fx.vfs().open_files(), 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn concurrent_descriptors_do_not_interfere() {
    let fx = Fixture::new();
    let backend = fx.mount.backend().clone();

    let handles: Vec<_> = (0..8u8)
        .map(|t| {
            let vfs = backend.clone();
            std::thread::spawn(move || {
                let path = format!("/t{t}");
                let fd = vfs.open(&path, rw_create(), 0).unwrap();
                for _ in 0..32 {
                    vfs.write(fd, &[t; 64]).unwrap();
                }
                vfs.lseek(fd, 0, 0).unwrap();
                let mut back = vec![0u8; 32 * 64];
                assert_eq!(vfs.read(fd, &mut back).unwrap(), back.len());
                assert!(back.iter().all(|&b| b == t));
                vfs.close(fd).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(backend.open_files(), 0);
}

#[cfg(not(feature = "readonly"))]
#[test]
fn blocking_device_lock_serializes_card_access() {
    let _serial = serial();
    set_engine_faults(EngineFaults::default());
    let router = Arc::new(PathRouter::new());
    let mount = mount_with_raw_mutex::<MemEngine, _, BlockingRawMutex>(
        "/sd",
        small_card(),
        &SLOT,
        MountFlags::FORMAT,
        router.clone(),
    )
    .expect("mount");
    let backend = mount.backend().clone();

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let vfs = backend.clone();
            std::thread::spawn(move || {
                let fd = vfs.open(&format!("/b{t}"), rw_create(), 0).unwrap();
                for _ in 0..64 {
                    vfs.write(fd, &[t; 16]).unwrap();
                    vfs.fsync(fd).unwrap();
                }
                vfs.lseek(fd, 0, 0).unwrap();
                let mut back = vec![0u8; 64 * 16];
                assert_eq!(vfs.read(fd, &mut back).unwrap(), back.len());
                assert!(back.iter().all(|&b| b == t));
                vfs.close(fd).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(backend.open_files(), 0);
    drop(backend);
    mount.unmount().unwrap();
    assert!(router.is_empty());
}
