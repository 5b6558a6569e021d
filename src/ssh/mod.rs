use anyhow::{Context, Result};
use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

use crate::script::runner::Transport;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Uses the ssh2 crate (libssh2); blocking, so call from a spawn_blocking context.
pub fn ssh_connect(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<ssh2::Session> {
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid address {}", host))?;
    let addr = SocketAddr::new(ip, port);
    let timeout = Duration::from_secs(timeout_secs);

    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .with_context(|| format!("TCP connection to {} failed", addr))?;
    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = ssh2::Session::new().context("Failed to create SSH session")?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_secs.saturating_mul(1000).min(u32::MAX as u64) as u32);
    session.handshake().context("SSH handshake failed")?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Keyboard-interactive covers network OSes that reject plain password auth
    let mut prompter = PasswordPrompt {
        password: pass.to_string(),
    };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        anyhow::bail!("SSH authentication failed: all methods exhausted")
    }
}

/// Interactive shell on a PTY; each command is written as a line and its
/// output read until the session has been quiet for `read_quiet`.
pub struct SshShell {
    // Kept alive for as long as the channel is in use
    _session: ssh2::Session,
    channel: ssh2::Channel,
}

impl SshShell {
    pub fn open(
        host: &str,
        port: u16,
        user: &str,
        pass: &str,
        timeout_secs: u64,
        read_quiet: Duration,
    ) -> Result<Self> {
        let session = ssh_connect(host, port, user, pass, timeout_secs)?;

        let mut channel = session.channel_session().context("Failed to open channel")?;
        channel
            .request_pty("vt100", None, None)
            .context("Failed to request PTY")?;
        channel.shell().context("Failed to start shell")?;

        session.set_timeout(read_quiet.as_millis().clamp(1, u32::MAX as u128) as u32);

        let mut shell = Self {
            _session: session,
            channel,
        };
        // Discard the login banner and first prompt
        let banner = shell.read_until_quiet()?;
        tracing::debug!("SSH shell to {}:{} ready ({} banner bytes)", host, port, banner.len());
        Ok(shell)
    }

    fn read_until_quiet(&mut self) -> Result<String> {
        let mut output = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match self.channel.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) => return Err(e).context("Failed to read shell output"),
            }
        }
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

impl Transport for SshShell {
    fn send(&mut self, command: &str) -> Result<String> {
        if self.channel.eof() {
            anyhow::bail!("SSH channel closed by remote host");
        }
        self.channel
            .write_all(format!("{}\n", command).as_bytes())
            .context("Failed to write command")?;
        self.channel.flush().context("Failed to flush command")?;
        self.read_until_quiet()
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        let _ = self.channel.send_eof();
        let _ = self.channel.close();
    }
}
