// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Write an executable shell script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    {
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stub gpg that copies its input to the `--output` path.
pub const GPG_COPY: &str = r#"out=""
while [ $# -gt 1 ]; do
    if [ "$1" = "--output" ]; then out="$2"; shift; fi
    shift
done
cp "$1" "$out"
"#;

/// Stub gpg that leaves a partial output behind and fails.
pub const GPG_FAIL: &str = r#"while [ $# -gt 1 ]; do
    if [ "$1" = "--output" ]; then : > "$2"; fi
    shift
done
echo "gpg: support@redhat.com: skipped: No public key" >&2
exit 2
"#;

/// Stub gpg that writes part of its output and then hangs.
pub const GPG_HANG: &str = r#"while [ $# -gt 1 ]; do
    if [ "$1" = "--output" ]; then echo "partial" > "$2"; fi
    shift
done
exec sleep 30
"#;

/// What the fake FTP server saw during one session.
#[derive(Debug, Default)]
pub struct FtpSessionLog {
    pub commands: Vec<String>,
    pub stored: Vec<(String, Vec<u8>)>,
}

/// Single-session FTP server on localhost.
pub struct FakeFtpServer {
    pub port: u16,
    handle: JoinHandle<FtpSessionLog>,
}

impl FakeFtpServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream)
        });
        Self { port, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("ftp://127.0.0.1:{}{}", self.port, path)
    }

    /// Wait for the session to end and return its log.
    pub fn finish(self) -> FtpSessionLog {
        self.handle.join().unwrap()
    }
}

fn serve(stream: TcpStream) -> FtpSessionLog {
    let mut log = FtpSessionLog::default();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    let mut passive: Option<TcpListener> = None;

    reply(&mut writer, "220-Welcome\r\n220 Fake FTP ready");

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end().to_string();
        log.commands.push(line.clone());
        let (verb, arg) = line.split_once(' ').unwrap_or((line.as_str(), ""));

        match verb {
            "USER" => reply(&mut writer, "331 Password required"),
            "PASS" => reply(&mut writer, "230 Logged in"),
            "CWD" => reply(&mut writer, "250 Directory changed"),
            "TYPE" => reply(&mut writer, "200 Type set"),
            "PASV" => {
                let data = TcpListener::bind("127.0.0.1:0").unwrap();
                let port = data.local_addr().unwrap().port();
                passive = Some(data);
                reply(
                    &mut writer,
                    &format!("227 Entering Passive Mode (10,0,0,1,{},{})", port >> 8, port & 0xff),
                );
            }
            "STOR" => {
                let Some(data) = passive.take() else {
                    reply(&mut writer, "425 Use PASV first");
                    continue;
                };
                reply(&mut writer, "150 Ok to send data");
                let (mut conn, _) = data.accept().unwrap();
                let mut bytes = Vec::new();
                conn.read_to_end(&mut bytes).unwrap();
                log.stored.push((arg.to_string(), bytes));
                reply(&mut writer, "226 Transfer complete");
            }
            "QUIT" => {
                reply(&mut writer, "221 Goodbye");
                break;
            }
            _ => reply(&mut writer, "502 Command not implemented"),
        }
    }

    log
}

fn reply(writer: &mut TcpStream, text: &str) {
    writer.write_all(text.as_bytes()).unwrap();
    writer.write_all(b"\r\n").unwrap();
    writer.flush().unwrap();
}
