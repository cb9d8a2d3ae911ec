//! Integration tests for command execution through the public facade
//!
//! These tests drive Redtape the way an embedding server would: token
//! streams in, replies out.

use redtape::storage::expiry::now_millis;
use redtape::{Config, Redtape, Reply};

fn redtape() -> Redtape {
    Redtape::new(Config::default()).unwrap()
}

#[test]
fn test_string_commands_end_to_end() {
    let rt = redtape();

    assert_eq!(rt.execute(&["SET", "name", "alice"]), Reply::ok());
    assert_eq!(rt.execute(&["GET", "name"]).to_string(), "alice");
    assert_eq!(rt.execute(&["EXISTS", "name", "name"]), Reply::Integer(2));
    assert_eq!(rt.execute(&["DEL", "name"]), Reply::Integer(1));
    assert_eq!(rt.execute(&["GET", "name"]), Reply::nil());
}

#[test]
fn test_binary_and_empty_values() {
    let rt = redtape();

    let value: &[u8] = b"\x00\xffpayload with spaces";
    let tokens: [&[u8]; 3] = [b"SET", b"blob", value];
    assert_eq!(rt.execute(&tokens), Reply::ok());

    let expected: [&[u8]; 3] = [b"$21\r\n", value, b"\r\n"];
    assert_eq!(rt.execute(&["GET", "blob"]).to_resp_bytes(), expected.concat());

    assert_eq!(rt.execute(&["SET", "empty", ""]), Reply::ok());
    assert_eq!(rt.execute(&["GET", "empty"]).to_resp_bytes(), b"$0\r\n\r\n");
    assert_eq!(rt.execute(&["GET", "missing"]).to_resp_bytes(), b"$-1\r\n");
}

#[test]
fn test_set_option_matrix() {
    let rt = redtape();

    assert_eq!(rt.execute_line("SET city paris XX"), Reply::nil());
    assert_eq!(rt.execute_line("SET city paris NX"), Reply::ok());
    assert_eq!(rt.execute_line("SET city rome NX"), Reply::nil());
    assert_eq!(rt.execute_line("SET city rome XX"), Reply::ok());
    assert_eq!(rt.execute_line("set city oslo xx get").to_string(), "rome");
    assert_eq!(rt.execute_line("SET town lyon NX GET"), Reply::nil());
    assert_eq!(rt.execute_line("GET town").to_string(), "lyon");
}

#[test]
fn test_set_expiry_options() {
    let rt = redtape();

    let before = now_millis();
    rt.execute_line("SET a 1 PX 5000");
    let at = rt.store().get("a").unwrap().unwrap().expires_at.unwrap();
    assert!(at >= before + 5000 && at <= now_millis() + 5000);

    let deadline = now_millis() + 60_000;
    rt.execute_line(&format!("SET b 2 PXAT {deadline}"));
    assert_eq!(rt.store().get("b").unwrap().unwrap().expires_at, Some(deadline));

    assert_eq!(rt.execute_line("SET c 3 EXAT 1577882096"), Reply::ok());
    assert_eq!(rt.execute_line("EXISTS c"), Reply::Integer(0));

    rt.execute_line("SET b 4");
    assert_eq!(rt.execute_line("TTL b"), Reply::Integer(-1));
}

#[test]
fn test_expire_family() {
    let rt = redtape();
    rt.execute_line("SET name alice");

    assert_eq!(rt.execute_line("EXPIRE name 100"), Reply::Integer(1));
    assert_eq!(rt.execute_line("TTL name"), Reply::Integer(100));

    assert_eq!(rt.execute_line("PEXPIRE name 2500"), Reply::Integer(1));
    match rt.execute_line("PTTL name") {
        Reply::Integer(ms) => assert!(ms > 2000 && ms <= 2500),
        other => panic!("unexpected reply {other:?}"),
    }

    let at = now_millis() / 1000 + 3600;
    assert_eq!(rt.execute_line(&format!("EXPIREAT name {at}")), Reply::Integer(1));
    assert_eq!(
        rt.store().get("name").unwrap().unwrap().expires_at,
        Some(at * 1000)
    );

    assert_eq!(rt.execute_line("PERSIST name"), Reply::Integer(1));
    assert_eq!(rt.execute_line("PEXPIREAT name 0"), Reply::Integer(1));
    assert_eq!(rt.execute_line("GET name"), Reply::nil());
    assert_eq!(rt.execute_line("EXPIRE name 10"), Reply::Integer(0));
}

#[test]
fn test_error_replies_are_distinct() {
    let rt = redtape();

    let arity = rt.execute_line("SET name");
    let syntax = rt.execute_line("SET name alice NX XX");
    let not_int = rt.execute_line("EXPIRE name soon");

    assert_eq!(arity.to_string(), "(error) ERR wrong number of arguments for 'set' command");
    assert_eq!(syntax.to_string(), "(error) ERR syntax error");
    assert_eq!(
        not_int.to_resp_bytes(),
        b"-ERR value is not an integer or out of range\r\n"
    );
    assert_eq!(rt.execute_line(""), Reply::Error("ERR syntax error".to_string()));
    assert_eq!(
        rt.execute::<&str>(&[]),
        Reply::Error("ERR syntax error".to_string())
    );
}

#[test]
fn test_lazy_expiration_without_sweep() {
    let rt = redtape();
    rt.execute_line("SET name alice PX 1");
    std::thread::sleep(std::time::Duration::from_millis(10));

    assert_eq!(rt.execute_line("GET name"), Reply::nil());
    assert_eq!(rt.execute_line("SET name bob NX"), Reply::ok());
    assert_eq!(rt.execute_line("GET name").to_string(), "bob");
}
