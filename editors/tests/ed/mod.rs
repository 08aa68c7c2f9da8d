//! Integration tests for the ed line editor.
//!
//! These tests drive a full session over in-memory input and output,
//! on both line stores.

use ed_core::{Session, SessionConfig, StorageKind};
use std::fs;
use std::io::Cursor;
use tempfile::NamedTempFile;

const STORES: [StorageKind; 2] = [StorageKind::Memory, StorageKind::Scratch];

fn run_script(config: SessionConfig, file: Option<&str>, stdin: &str) -> String {
    let mut out = Vec::new();
    let mut session = Session::new(Cursor::new(stdin.as_bytes()), &mut out, config).unwrap();
    if let Some(path) = file {
        session.load_file(path).unwrap();
    }
    session.run().unwrap();
    drop(session);
    String::from_utf8(out).unwrap()
}

fn silent(storage: StorageKind) -> SessionConfig {
    SessionConfig {
        silent: true,
        storage,
        ..Default::default()
    }
}

// Run a script in silent mode on every store
fn ed_test(stdin: &str, expected_out: &str) {
    for storage in STORES {
        let out = run_script(silent(storage), None, stdin);
        assert_eq!(out, expected_out, "storage {:?}", storage);
    }
}

// Same, with a file loaded first
fn ed_test_with_file(file_content: &str, stdin: &str, expected_out: &str) {
    let temp = NamedTempFile::new().unwrap();
    fs::write(temp.path(), file_content).unwrap();
    let path = temp.path().to_string_lossy().to_string();

    for storage in STORES {
        let out = run_script(silent(storage), Some(&path), stdin);
        assert_eq!(out, expected_out, "storage {:?}", storage);
    }
}

const FIVE: &str = "a\nL1\nL2\nL3\nL4\nL5\n.\n";

// ============================================================================
// Basic Operation Tests
// ============================================================================

#[test]
fn test_ed_quit() {
    ed_test("q\n", "");
}

#[test]
fn test_ed_force_quit() {
    ed_test("a\nunsaved\n.\nQ\np\n", "");
}

#[test]
fn test_ed_end_of_input() {
    ed_test("a\nno terminator", "");
}

#[test]
fn test_ed_append_and_print() {
    ed_test(
        "a\nhello world\nline two\n.\n1,$p\nQ\n",
        "hello world\nline two\n",
    );
}

#[test]
fn test_ed_insert_and_print() {
    ed_test(
        "a\nfirst line\n.\n1i\ninserted line\n.\n1,$p\nQ\n",
        "inserted line\nfirst line\n",
    );
}

#[test]
fn test_ed_inline_text() {
    ed_test("a one\na two\n1i zero\n,p\nQ\n", "zero\none\ntwo\n");
}

#[test]
fn test_ed_number_command() {
    ed_test(
        "a\nline one\nline two\n.\n1,$n\nQ\n",
        "     1\tline one\n     2\tline two\n",
    );
}

#[test]
fn test_ed_list_command() {
    ed_test("a\nhello\tthere\n.\n1l\nQ\n", "hello\\tthere$\n");
}

#[test]
fn test_ed_bare_address_and_newline() {
    ed_test(&format!("{}2\n\n\nQ\n", FIVE), "L2\nL3\nL4\n");
}

#[test]
fn test_ed_sub_command() {
    ed_test(&format!("{}2dp\nQ\n", FIVE), "L1\n");
}

// ============================================================================
// Buffer Reordering Tests
// ============================================================================

#[test]
fn test_ed_delete() {
    ed_test(&format!("{}2,4d\n=\n,p\nQ\n", FIVE), "1\nL1\nL5\n");
}

#[test]
fn test_ed_move() {
    ed_test(
        &format!("{}4,5m0\n=\n,p\nQ\n", FIVE),
        "2\nL4\nL5\nL1\nL2\nL3\n",
    );
}

#[test]
fn test_ed_move_forward() {
    ed_test(&format!("{}1m$\n=\n,p\nQ\n", FIVE), "5\nL2\nL3\nL4\nL5\nL1\n");
}

#[test]
fn test_ed_copy() {
    ed_test("a\na\nb\n.\n1,2k2\n,p\nQ\n", "a\nb\na\nb\n");
    ed_test("a\na\nb\n.\n2k0\n=\n,p\nQ\n", "1\nb\na\nb\n");
}

#[test]
fn test_ed_mirror() {
    ed_test("a\n1\n2\n3\n.\nM\n,p\nQ\n", "3\n2\n1\n");
}

#[test]
fn test_ed_change() {
    ed_test(
        &format!("{}2,3c\nnew\n.\n,p\nQ\n", FIVE),
        "L1\nnew\nL4\nL5\n",
    );
}

// ============================================================================
// Pattern Tests
// ============================================================================

#[test]
fn test_ed_substitute() {
    ed_test(
        "a\na.c abc\n.\ns/./X/g\np\nS/a(.)c/<\\1>/g\np\nQ\n",
        "aXc abc\n<X> <b>\n",
    );
}

#[test]
fn test_ed_substitute_nth() {
    ed_test("a\nxxx\n.\ns/x/y/2\np\nQ\n", "xyx\n");
}

#[test]
fn test_ed_transliterate() {
    ed_test("a\nhello\n.\nt/el/ip/\np\nQ\n", "hippo\n");
}

#[test]
fn test_ed_join_and_break() {
    ed_test(
        "a\na\nb\nc\n.\n1,3j/-/\np\nb/-/\n,p\nQ\n",
        "a-b-c\na\nb\nc\n",
    );
}

#[test]
fn test_ed_search() {
    ed_test(
        "a\nfoo\nbar\nbaz\n.\n1\n/ba/\n//\n\\foo\\\nQ\n",
        "foo\nbar\nbaz\nfoo\n",
    );
}

// ============================================================================
// Global Command Tests
// ============================================================================

#[test]
fn test_ed_global_substitute() {
    ed_test(
        "a\nquit\nabc\nbuild\nfluid\nxyz\n.\n2\n1,5g/ui/s/ui/++/g\n=\n,p\nQ\n",
        "abc\n3\nq++t\nabc\nb++ld\nfl++d\nxyz\n",
    );
}

#[test]
fn test_ed_global_print() {
    ed_test("a\napple\nbanana\napricot\n.\ng/ap/p\nQ\n", "apple\napricot\n");
}

#[test]
fn test_ed_global_delete() {
    ed_test(
        "a\nkeep 1\ndrop\nkeep 2\ndrop\n.\nv/keep/d\n,p\nQ\n",
        "keep 1\nkeep 2\n",
    );
}

#[test]
fn test_ed_global_move_to_top() {
    ed_test("a\na\nx\nb\ny\n.\ng/[xy]/m0\n,p\nQ\n", "y\nx\na\nb\n");
}

#[test]
fn test_ed_interactive_global() {
    ed_test(
        "a\nx1\nx2\n.\nG/x/\ns/x/y/\n\nq\n,p\nQ\n",
        "x1\nx2\ny1\nx2\n",
    );
}

#[test]
fn test_ed_interactive_global_abort() {
    ed_test(
        "a\nx1\nx2\n.\nG/x/\nQ\n,p\nQ\n",
        "x1\nx1\nx2\n",
    );
}

#[test]
fn test_ed_bulk_mark() {
    ed_test("a\na\nb\nc\n.\n1'k\n3'k\n\"kd\n,p\nQ\n", "b\n");
}

#[test]
fn test_ed_nested_global_rejected() {
    ed_test(
        "a\nx\n.\nH\ng/x/g/x/p\nQ\n",
        "?\ncommand not allowed in glob\n",
    );
}

// ============================================================================
// Pager Tests
// ============================================================================

#[test]
fn test_ed_pager_width() {
    for storage in STORES {
        let config = SessionConfig {
            silent: true,
            storage,
            pager: 1,
            ..Default::default()
        };
        let out = run_script(config, None, "a\n1\n2\n3\n4\n5\n.\n3p\nz 0\n3p\nz\nQ\n");
        assert_eq!(out, "2\n3\n4\n3\n0\n");
    }
}

#[test]
fn test_ed_increments() {
    ed_test("a\n1\n2\n3\n4\n5\n.\n3<1>2p\nQ\n", "2\n3\n4\n5\n");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_ed_address_error() {
    ed_test("H\n15s/pattern/substitute/\nQ\n", "?\ninvalid address: 15\n");
}

#[test]
fn test_ed_range_error() {
    ed_test("a\na\nb\n.\nH\n2,1p\nQ\n", "?\ninvalid range\n");
}

#[test]
fn test_ed_destination_in_range() {
    ed_test(
        &format!("{}H\n2,4m3\nQ\n", FIVE),
        "?\ndestination inside source range\n",
    );
}

#[test]
fn test_ed_quiet_errors_and_help() {
    ed_test("x\nh\nh p\nQ\n", "?\nunrecognized character 'x'\n(.,.)p\tprint lines\n");
}

#[test]
fn test_ed_quit_warning() {
    ed_test("a\nx\n.\nq\nq\np\n", "?\n");
}

// ============================================================================
// File Operation Tests
// ============================================================================

#[test]
fn test_ed_read_file() {
    ed_test_with_file("content from file\n", "1,$p\nq\n", "content from file\n");
}

#[test]
fn test_ed_write_file() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_string_lossy().to_string();

    ed_test(&format!("a\ntest content\n.\nw {}\nq\n", path), "");
    let content = fs::read_to_string(temp.path()).unwrap();
    assert_eq!(content, "test content\n");
}

#[test]
fn test_ed_byte_counts() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_string_lossy().to_string();

    let out = run_script(
        SessionConfig::default(),
        None,
        &format!("a\nhello\nworld\n.\nw {}\ne {}\nq\n", path, path),
    );
    assert_eq!(out, "12\n12\n");
}

#[test]
fn test_ed_edit_command() {
    let temp = NamedTempFile::new().unwrap();
    fs::write(temp.path(), "test content\n").unwrap();

    ed_test(
        &format!("e {}\n1p\nq\n", temp.path().to_string_lossy()),
        "test content\n",
    );
}

#[test]
fn test_ed_read_command() {
    let temp = NamedTempFile::new().unwrap();
    fs::write(temp.path(), "from file\n").unwrap();

    ed_test(
        &format!("a\nfirst\nlast\n.\n1r {}\n=\n,p\nQ\n", temp.path().to_string_lossy()),
        "2\nfirst\nfrom file\nlast\n",
    );
}

#[test]
fn test_ed_filename_command() {
    let temp = NamedTempFile::new().unwrap();
    fs::write(temp.path(), "content\n").unwrap();
    let path = temp.path().to_string_lossy().to_string();

    for storage in STORES {
        let out = run_script(silent(storage), Some(&path), "f\nq\n");
        assert_eq!(out, format!("{}\n", path));
    }
}

// ============================================================================
// Shell Tests
// ============================================================================

#[test]
fn test_ed_shell_escape() {
    ed_test("!echo hi\nq\n", "hi\n");
    let out = run_script(SessionConfig::default(), None, "!echo hi\nq\n");
    assert_eq!(out, "hi\n!\n");
}

#[test]
fn test_ed_read_shell_output() {
    ed_test("r !printf 'a\\nb\\n'\n,p\nQ\n", "a\nb\n");
}

#[test]
fn test_ed_write_large_buffer_to_shell() {
    let lines: Vec<String> = (1..=20000).map(|i| format!("line {}", i)).collect();
    let text = lines.join("\n") + "\n";
    ed_test(&format!("a\n{}.\nw !cat\nQ\n", text), &text);
}

#[test]
fn test_ed_edit_invalid_utf8() {
    let temp = NamedTempFile::new().unwrap();
    fs::write(temp.path(), b"ok\n\xff\xfeend\n").unwrap();

    ed_test(
        &format!("e {}\n,p\nQ\n", temp.path().to_string_lossy()),
        "ok\n\u{fffd}\u{fffd}end\n",
    );
}
