// src/upload/ftp.rs

//! Minimal FTP client for report delivery
//!
//! Implements just the commands needed to store one file: login, CWD,
//! binary type, passive mode and STOR. Replies follow RFC 959, including
//! multi-line `123-` continuations. The data connection always goes to the
//! control connection's peer address; the host in a PASV reply is ignored,
//! since servers behind NAT commonly advertise unreachable private
//! addresses.

use crate::error::{Error, Result};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Default FTP control port
pub const DEFAULT_PORT: u16 = 21;

/// A server reply: status code and text (continuation lines joined)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    fn is_positive_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

/// Parse the `h1,h2,h3,h4,p1,p2` tuple of a 227 reply into a port
pub fn parse_pasv_port(text: &str) -> Result<u16> {
    let start = text
        .find('(')
        .ok_or_else(|| Error::Ftp(format!("Malformed PASV reply: {}", text)))?;
    let end = text[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or_else(|| Error::Ftp(format!("Malformed PASV reply: {}", text)))?;

    let numbers: Vec<u8> = text[start + 1..end]
        .split(',')
        .map(|n| n.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::Ftp(format!("Malformed PASV reply: {}", text)))?;

    if numbers.len() != 6 {
        return Err(Error::Ftp(format!("Malformed PASV reply: {}", text)));
    }

    Ok((u16::from(numbers[4]) << 8) | u16::from(numbers[5]))
}

/// An open FTP control connection
pub struct FtpSession {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    peer: IpAddr,
    timeout: Duration,
}

impl FtpSession {
    /// Connect and read the server greeting
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        let mut last_err = io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", host),
        );

        for addr in addrs {
            debug!("Connecting to FTP server {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    let writer = stream.try_clone()?;
                    let mut session = Self {
                        reader: BufReader::new(stream),
                        writer,
                        peer: addr.ip(),
                        timeout,
                    };
                    session.expect(&[220])?;
                    return Ok(session);
                }
                Err(e) => last_err = e,
            }
        }

        Err(last_err.into())
    }

    /// Read one complete reply
    pub fn read_reply(&mut self) -> Result<Reply> {
        let first = self.read_line()?;
        let code = parse_code(&first)?;
        let mut text = first.get(4..).unwrap_or("").to_string();

        if first.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let line = self.read_line()?;
                text.push('\n');
                if let Some(rest) = line.strip_prefix(&terminator) {
                    text.push_str(rest);
                    break;
                }
                text.push_str(&line);
            }
        }

        debug!("FTP <- {} {}", code, text);
        Ok(Reply { code, text })
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(Error::Ftp("Connection closed by server".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Send a command line without waiting for the reply
    fn send(&mut self, command: &str) -> Result<()> {
        if command.starts_with("PASS ") {
            debug!("FTP -> PASS ****");
        } else {
            debug!("FTP -> {}", command);
        }
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read a reply and require one of the given codes
    fn expect(&mut self, codes: &[u16]) -> Result<Reply> {
        let reply = self.read_reply()?;
        if codes.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(Error::Ftp(format!("Unexpected reply {} {}", reply.code, reply.text)))
        }
    }

    /// Send a command and require one of the given reply codes
    pub fn command(&mut self, command: &str, codes: &[u16]) -> Result<Reply> {
        self.send(command)?;
        self.expect(codes)
    }

    /// Authenticate; anonymous unless both user and password are given
    pub fn login(&mut self, user: Option<&str>, password: Option<&str>) -> Result<()> {
        let (user, password) = match (user, password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => (user, password),
            _ => ("anonymous", "anonymous@"),
        };

        let reply = self.command(&format!("USER {}", user), &[230, 331])?;
        if reply.code == 331 {
            self.command(&format!("PASS {}", password), &[230, 202])?;
        }
        Ok(())
    }

    /// Change the remote working directory
    pub fn cwd(&mut self, path: &str) -> Result<()> {
        self.command(&format!("CWD {}", path), &[250])?;
        Ok(())
    }

    /// Enter passive mode and open the data connection
    fn open_passive(&mut self) -> Result<TcpStream> {
        let reply = self.command("PASV", &[227])?;
        let port = parse_pasv_port(&reply.text)?;
        let addr = SocketAddr::new(self.peer, port);
        debug!("Opening passive data connection to {}", addr);
        let data = TcpStream::connect_timeout(&addr, self.timeout)?;
        data.set_write_timeout(Some(self.timeout))?;
        Ok(data)
    }

    /// Store `reader`'s content under `name` in binary passive mode
    pub fn store<R: Read>(&mut self, name: &str, reader: &mut R) -> Result<u64> {
        self.command("TYPE I", &[200])?;
        let mut data = self.open_passive()?;

        self.send(&format!("STOR {}", name))?;
        let reply = self.read_reply()?;
        if !reply.is_positive_preliminary() {
            return Err(Error::Ftp(format!(
                "Server refused STOR: {} {}",
                reply.code, reply.text
            )));
        }

        let bytes = io::copy(reader, &mut data)?;
        data.flush()?;
        data.shutdown(Shutdown::Write)?;
        drop(data);

        self.expect(&[226, 250])?;
        debug!("Stored {} bytes as {}", bytes, name);
        Ok(bytes)
    }

    /// End the session politely
    pub fn quit(mut self) -> Result<()> {
        self.command("QUIT", &[221])?;
        Ok(())
    }
}

fn parse_code(line: &str) -> Result<u16> {
    line.get(..3)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| Error::Ftp(format!("Malformed reply line: {}", line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pasv_port() {
        let port = parse_pasv_port("Entering Passive Mode (127,0,0,1,195,80).").unwrap();
        assert_eq!(port, 195 * 256 + 80);
    }

    #[test]
    fn test_parse_pasv_port_malformed() {
        assert!(parse_pasv_port("Entering Passive Mode").is_err());
        assert!(parse_pasv_port("(1,2,3)").is_err());
        assert!(parse_pasv_port("(1,2,3,4,5,300)").is_err());
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("220 Welcome").unwrap(), 220);
        assert_eq!(parse_code("230-Logged in").unwrap(), 230);
        assert!(parse_code("hi").is_err());
    }
}
