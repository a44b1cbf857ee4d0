//! Integration tests for the built-in encoders.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cmdrunner::encoders::PowerShellEncoder;
use cmdrunner::pipeline::{encode, prepare};
use cmdrunner::stage::Preparation;
use common::*;

fn encode_one(name: &str, args: &str, command: &str) -> String {
    encoder(name, args).encode(command, &Preparation::default())
}

// -- cmd.exe wrapping ---------------------------------------------------------

/// Test that inputs without metacharacters pass through verbatim.
#[test]
fn wincmd_plain_input_is_verbatim() {
    for input in ["whoami /all", "dir C:\\Users", "echo \"quoted\" text"] {
        assert_eq!(encode_one("wincmd", "", input), format!("cmd /S /C {}", input));
    }
}

/// Test that every metacharacter gets one caret.
#[test]
fn wincmd_escapes_metacharacters() {
    assert_eq!(
        encode_one("wincmd", "", "type a.txt | find \"x\" & (echo ^) > out"),
        "cmd /S /C type a.txt ^| find \"x\" ^& ^(echo ^^^) ^> out"
    );
}

/// Test that the echo encoder echoes through cmd.exe.
#[test]
fn echo_encoder_wraps_echo() {
    assert_eq!(encode_one("echo", "", "hello"), "cmd /S /C echo hello");
    assert_eq!(encode_one("echo", "", "a&b"), "cmd /S /C echo a^&b");
}

/// Test that the plain encoder is the identity.
#[test]
fn cmd_encoder_is_identity() {
    assert_eq!(encode_one("cmd", "", "ls -la | wc -l"), "ls -la | wc -l");
}

// -- SQL / PowerShell ---------------------------------------------------------

/// Test that single quotes are doubled for xp_cmdshell.
#[test]
fn xpcmdshell_doubles_single_quotes() {
    assert_eq!(
        encode_one("xpcmdshell", "", "echo 'hi'"),
        "EXEC xp_cmdshell 'echo ''hi''';"
    );
}

/// Test that the encoded command decodes back to the original text.
#[test]
fn powershell_round_trips() {
    for command in ["Get-Process", "Write-Output \"ünïcödé ✓\"", ""] {
        let wrapped = encode_one("powershell", "", command);
        let b64 = wrapped
            .strip_prefix("powershell -NoProfile -ExecutionPolicy Bypass -EncodedCommand ")
            .unwrap();
        assert_eq!(b64, PowerShellEncoder::encoded_command(command));

        let bytes = STANDARD.decode(b64).unwrap();
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), command);
    }
}

/// Test the UTF-16LE encoding of a known value.
#[test]
fn powershell_known_value() {
    assert_eq!(PowerShellEncoder::encoded_command("id"), "aQBkAA==");
}

// -- transports ---------------------------------------------------------------

/// Test the ssh command line with an identity file.
#[test]
fn ssh_with_identity() {
    assert_eq!(
        encode_one("ssh", "root 10.0.0.5 identity=/tmp/id", "echo \"a\\b\" | wc"),
        "ssh -i /tmp/id -o \"StrictHostKeyChecking no\" -o \"UserKnownHostsFile /dev/null\" \
         root@10.0.0.5 \"echo \\\"a\\\\b\\\" \\| wc\""
    );
}

/// Test the ssh command line without an identity file.
#[test]
fn ssh_without_identity() {
    assert_eq!(
        encode_one("ssh", "admin host", "id"),
        "ssh -o \"StrictHostKeyChecking no\" -o \"UserKnownHostsFile /dev/null\" admin@host \"id\""
    );
}

/// Test that curl splices the form-encoded command into the template.
#[test]
fn curl_splices_command() {
    assert_eq!(
        encode_one("curl", "http://t/x 'cmd=***&go=1'", "cat /etc/passwd"),
        "curl -s -k -X POST --data-binary \"cmd=cat+%2Fetc%2Fpasswd&go=1\" \"http://t/x\""
    );
}

/// Test a custom placeholder.
#[test]
fn curl_custom_placeholder() {
    assert_eq!(
        encode_one("curl", "http://t/x 'q=@@' replace='@@'", "a b"),
        "curl -s -k -X POST --data-binary \"q=a+b\" \"http://t/x\""
    );
}

// -- WMIC ---------------------------------------------------------------------

/// Test that a single WMIC stage is first of its type with its own delay.
#[test]
fn wmic_single_instance_prepare() {
    let chain = vec![encoder("wmic", "")];
    assert_eq!(
        prepare(&chain),
        vec![Preparation {
            total_delay: Some(2),
            first_of_type: true
        }]
    );
}

/// Test delays and first-of-type flags for two chained WMIC stages.
#[test]
fn wmic_two_instances_prepare() {
    let chain = vec![encoder("wmic", "delay=2"), encoder("wmic", "delay=3")];
    let preps = prepare(&chain);

    assert_eq!(preps[0].total_delay, Some(5));
    assert!(preps[0].first_of_type);
    assert_eq!(preps[1].total_delay, Some(3));
    assert!(!preps[1].first_of_type);
}

/// Test that stages without a delay do not change the sum.
#[test]
fn wmic_prepare_skips_stages_without_delay() {
    let chain = vec![
        encoder("wmic", "delay=2"),
        encoder("ssh", "u h"),
        encoder("wmic", "delay=4"),
    ];
    let preps = prepare(&chain);

    assert_eq!(preps[0].total_delay, Some(6));
    assert_eq!(preps[1], Preparation::default());
    assert_eq!(preps[2].total_delay, Some(4));
    assert!(!preps[2].first_of_type);
}

/// Test the capture command layout of a single WMIC stage.
#[test]
fn wmic_capture_layout() {
    let out = encode_one("wmic", "", "whoami");
    let parts: Vec<&str> = out.split(" && ").collect();

    assert_eq!(parts.len(), 5);
    assert!(parts[0].starts_with("mkdir \\\\localhost\\C$\\"));
    assert!(parts[1].starts_with("wmic process call create \"cmd /S /C (whoami) > C:\\"));
    assert!(parts[1].ends_with(".log\" >nul"));
    assert_eq!(parts[2], "ping -n 2 127.0.0.1 >nul");
    assert!(parts[3].starts_with("type \\\\localhost\\C$\\"));
    assert!(parts[4].starts_with("rmdir /S /Q \\\\localhost\\C$\\"));

    // The same temporary directory is created, read and removed.
    let dir = parts[0].trim_start_matches("mkdir \\\\localhost\\C$\\");
    assert!(parts[3].contains(dir));
    assert!(parts[4].ends_with(dir));
}

/// Test the fire-and-forget form.
#[test]
fn wmic_without_output() {
    assert_eq!(
        encode_one("wmic", "dc01 admin pw output=false", "echo \"x\""),
        "wmic /NODE:\"dc01\" /User:\"admin\" /Password:\"pw\" process call create \"echo \\\"x\\\"\""
    );
}

/// Test that the nested WMIC stage is caret-escaped inside the outer one.
#[test]
fn wmic_nested_chain_escapes_inner() {
    let chain = vec![encoder("wmic", "delay=2"), encoder("wmic", "host=h2 delay=3")];
    let (out, trace) = encode("ipconfig", &chain);

    assert_eq!(trace.len(), 2);
    assert!(trace[0].contains("/NODE:\"h2\""));
    assert!(trace[0].contains("process call create \"cmd /S /C ^(ipconfig^) ^> C:\\"));
    assert!(trace[0].contains("ping -n 3 127.0.0.1"));
    assert_eq!(out, trace[1]);
    assert!(out.starts_with("mkdir \\\\localhost\\C$\\"));
    assert!(out.contains("ping -n 5 127.0.0.1"));
}
