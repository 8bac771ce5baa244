use netat_core::*;
use std::io;

#[test]
fn test_thread_namespace_path_exists() {
    let path = ThreadId::current().net_ns_path();
    assert!(path.exists(), "{} should exist", path.display());
}

#[test]
fn test_threads_start_in_same_namespace() {
    let here = NamespaceId::current_thread().unwrap();
    let there = std::thread::spawn(|| NamespaceId::current_thread().unwrap())
        .join()
        .unwrap();

    assert_eq!(here, there);
}

#[test]
fn test_namespace_id_matches_proc_link() {
    let path = ThreadId::current().net_ns_path();
    let link = std::fs::read_link(&path).unwrap();
    let from_link: NamespaceId = link.to_string_lossy().parse().unwrap();

    let id = NamespaceId::current_thread().unwrap();
    assert!(from_link.matches(&id));
    assert!(id.matches(&from_link));
}

#[test]
fn test_unknown_thread_namespace() {
    let err = NamespaceId::of_thread(ThreadId::from_raw(i32::MAX)).unwrap_err();
    assert!(matches!(err, Error::OpenNamespace { .. }));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn test_error_source_chain() {
    use std::error::Error as _;

    let err = Error::Operation(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
    let source = err.source().expect("operation error has a source");
    assert_eq!(source.to_string(), "refused");
}
