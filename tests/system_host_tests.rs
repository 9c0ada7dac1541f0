//! Tests for SystemHost against a real directory tree
//!
//! The host is rooted in a temporary directory so the provisioning steps
//! that only touch the filesystem can run for real.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use ovpn_bootstrap::host::{Host, SystemHost};
use ovpn_bootstrap::layout::{CCD_DIR, CLIENT_ROUTE_FILE, OPENVPN_DIR};
use ovpn_bootstrap::{ClientRoute, EncodedBlob, MaterialFile, PkiMaterials, Provisioner};
use tempfile::TempDir;

fn staged_root() -> (TempDir, SystemHost) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("etc/openvpn")).unwrap();
    let host = SystemHost::with_root(dir.path());
    (dir, host)
}

fn materials() -> PkiMaterials {
    PkiMaterials {
        server_key: EncodedBlob::encode([0u8, 1, 2, 255, b'\n']),
        server_crt: EncodedBlob::encode("crt\n"),
        ca_crt: EncodedBlob::encode("ca\n"),
        server_conf: EncodedBlob::encode("dev tun\n"),
        dh2048_pem: EncodedBlob::encode("dh\n"),
    }
}

#[test]
fn test_materialize_on_disk() {
    let (dir, host) = staged_root();
    let mut provisioner = Provisioner::new(host);
    provisioner
        .materialize(&materials(), &mut Vec::<String>::new())
        .unwrap();

    let key_path = dir.path().join("etc/openvpn/server.key");
    assert_eq!(fs::read(&key_path).unwrap(), [0u8, 1, 2, 255, b'\n']);
    let mode = fs::metadata(&key_path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o400);

    for file in MaterialFile::all() {
        assert!(
            dir.path().join("etc/openvpn").join(file.file_name()).is_file(),
            "{} should exist",
            file
        );
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("etc/openvpn/server.conf")).unwrap(),
        "dev tun\n"
    );
}

#[test]
fn test_precondition_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = Provisioner::new(SystemHost::with_root(dir.path()));
    let err = provisioner.check_precondition().unwrap_err();
    assert!(err.is_precondition());
    assert!(!dir.path().join("etc").exists());
}

#[test]
fn test_ccd_and_route_on_disk() {
    let (dir, host) = staged_root();
    let mut provisioner = Provisioner::new(host);
    provisioner
        .create_client_config_dir(&mut Vec::<String>::new())
        .unwrap();
    provisioner
        .write_routing_directive(
            &ClientRoute::new("192.168.50.0", "255.255.255.0"),
            &mut Vec::<String>::new(),
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("etc/openvpn/ccd/client")).unwrap(),
        "iroute 192.168.50.0 255.255.255.0\n"
    );

    // Second creation fails because the directory is now present
    assert!(
        provisioner
            .create_client_config_dir(&mut Vec::<String>::new())
            .is_err()
    );
}

#[test]
fn test_cleanup_on_disk() {
    let (dir, host) = staged_root();
    fs::write(dir.path().join("etc/openvpn/ipp.txt"), "client,10.8.0.6\n").unwrap();
    let mut provisioner = Provisioner::new(host);
    provisioner.cleanup();
    assert!(!dir.path().join("etc/openvpn/ipp.txt").exists());
    assert!(dir.path().join("etc/openvpn").is_dir());
}

#[test]
fn test_dry_run_leaves_disk_untouched() {
    let (dir, host) = staged_root();
    let mut host = host.dry_run(true);

    host.write_file(Path::new("/etc/openvpn/server.crt"), b"crt").unwrap();
    host.set_mode(Path::new("/etc/openvpn/server.crt"), 0o400).unwrap();
    host.create_dir(Path::new(CCD_DIR)).unwrap();
    host.write_file(Path::new(CLIENT_ROUTE_FILE), b"iroute").unwrap();

    assert!(!dir.path().join("etc/openvpn/server.crt").exists());
    assert!(!dir.path().join("etc/openvpn/ccd").exists());
    assert!(host.is_dir(Path::new(OPENVPN_DIR)));
}

#[test]
fn test_dry_run_reports_existing_ccd() {
    let (dir, host) = staged_root();
    fs::create_dir(dir.path().join("etc/openvpn/ccd")).unwrap();
    let mut host = host.dry_run(true);
    let err = host.create_dir(Path::new(CCD_DIR)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
}

#[test]
fn test_remove_missing_file_is_not_found() {
    let (_dir, mut host) = staged_root();
    let err = host
        .remove_file(Path::new("/etc/openvpn/openvpn-status.log"))
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
