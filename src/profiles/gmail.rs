//! Gmail assistant
//!
//! The Gmail tool server authenticates through a separate local OAuth
//! server (`npx <package> auth` on port 3000). This module installs the
//! package, runs that auth server, and drives the login/logout cycle around
//! the REPL.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};

use crate::agent::ChatBackend;
use crate::cli::{Console, ExitReason, InputSource, Repl, ReplOptions};
use crate::conversation::History;
use crate::mcp::GMAIL_PACKAGE;

/// Where the auth server listens
pub const AUTH_ADDR: &str = "localhost:3000";

/// How long to wait for the auth server to accept connections
pub const READY_TIMEOUT: Duration = Duration::from_secs(30);

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// An auth server that exits within this window failed to start
const STARTUP_GRACE: Duration = Duration::from_secs(2);

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// `pkill -f` pattern for leftover auth servers; the tool server itself runs
/// the same package without the `auth` argument and must survive
const STALE_AUTH_PATTERN: &str = "server-gmail-autoauth-mcp.* auth";

pub const LOGOUT_WORDS: [&str; 2] = ["logout", "disconnect"];

pub const AUTH_PROMPT: &str = "Please run the authentication process to connect to Gmail.";

pub const ACCOUNT_PROMPT: &str = "Please show me the currently authenticated Gmail address.";

pub const SYSTEM_PROMPT: &str = r#"You are a Gmail management assistant that can help users manage their inbox through natural language commands.

You can perform the following actions using Gmail's API:

1. SENDING EMAILS:
   - Send emails with subject, content, and recipients
   - Include CC and BCC recipients
   - Create draft emails without sending

2. READING EMAILS:
   - Read specific emails by ID
   - Search emails using Gmail's search syntax
   - List emails from inbox, sent, or custom labels

3. EMAIL MANAGEMENT:
   - Mark emails as read/unread
   - Move emails to different labels/folders
   - Delete emails
   - Batch process multiple emails at once

4. LABEL MANAGEMENT:
   - List all available Gmail labels
   - Create new labels
   - Rename or update existing labels
   - Delete labels

When helping users, always clarify their request if needed, and confirm important actions before performing them.
Provide clear summaries of results after completing actions."#;

pub const INITIAL_PROMPT: &str = r#"I'm your Gmail assistant. Here are all the available tools I can use to help manage your inbox:

🔐 AUTHENTICATION
- To disconnect the current Gmail account, type 'logout' or 'disconnect'
- You'll need to authenticate again with a different account after disconnecting

📧 EMAIL SENDING
- send_email: Send new emails with subject, content, and attachments
  • Specify recipients (To, CC, BCC)
  • Add attachments
  • Support for international characters

- draft_email: Create draft emails without sending
  • Save emails to draft folder
  • Edit later before sending

📥 EMAIL READING
- read_email: Read specific emails by ID
  • View full email content
  • See attachment information
  • Access email headers

- search_emails: Search your inbox with Gmail's powerful syntax
  • from: (sender)
  • to: (recipient)
  • subject: (text in subject)
  • has:attachment
  • after:/before: (date)
  • is:unread/read
  • label: (label name)

📂 EMAIL ORGANIZATION
- modify_email: Organize individual emails
  • Archive emails (remove from inbox)
  • Move to different labels/folders
  • Mark as read/unread
  • Mark as important/not important

- delete_email: Permanently delete individual emails
  • Remove emails completely
  • Cannot be undone

🏷️ LABEL MANAGEMENT
- list_email_labels: View all your Gmail labels
- create_label: Create new labels
- update_label: Rename or modify existing labels
- delete_label: Remove unwanted labels
- get_or_create_label: Get existing or create new label

📋 BATCH OPERATIONS
- batch_modify_emails: Process multiple emails at once
  • Archive multiple emails
  • Mark as read/unread
  • Add/remove labels
  • Move to different folders

- batch_delete_emails: Delete multiple emails efficiently
  • Permanently delete multiple emails
  • Use with caution - cannot be undone

What would you like help with? You can ask me to:
• "Show my unread emails"
• "Search for emails from john@example.com with attachments"
• "Archive all emails older than 30 days"
• "Create a new label called 'Projects'"
• "Send an email to sarah@example.com about the meeting tomorrow"
• "Move all emails from bob@example.com to the Archive folder"
• "Delete all emails in the Spam folder"
• "Archive newsletters older than 6 months"

Type:
• 'logout' or 'disconnect' to switch Gmail accounts
• 'exit', 'quit', or 'bye' to end the session"#;

const TROUBLESHOOTING: [&str; 5] = [
    "1. Make sure you have OAuth credentials in place",
    "2. Check that port 3000 is available",
    "3. Try manually visiting http://localhost:3000",
    "4. Ensure your browser can access localhost",
    "5. Make sure Node.js and npm are installed",
];

/// Result of `ensure_installed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    AlreadyInstalled,
    Installed,
}

/// Install the Gmail tool server package globally unless npm already has it
pub async fn ensure_installed() -> Result<InstallStatus> {
    tracing::info!("[Gmail] Checking for {}", GMAIL_PACKAGE);

    let listed = Command::new("npm")
        .args(["list", "-g", GMAIL_PACKAGE])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let listed = match listed {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!("npm not found. Please install Node.js and npm first.")
        }
        Err(e) => return Err(e).context("Failed to run npm"),
    };

    if String::from_utf8_lossy(&listed.stdout).contains(GMAIL_PACKAGE) {
        tracing::info!("[Gmail] {} is already installed", GMAIL_PACKAGE);
        return Ok(InstallStatus::AlreadyInstalled);
    }

    tracing::info!("[Gmail] Installing {}", GMAIL_PACKAGE);
    let installed = Command::new("npm")
        .args(["install", "-g", GMAIL_PACKAGE])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("Failed to run npm install")?;

    if !installed.status.success() {
        bail!(
            "Error installing Gmail MCP server: {}",
            String::from_utf8_lossy(&installed.stderr).trim()
        );
    }

    Ok(InstallStatus::Installed)
}

/// The local OAuth server used by the Gmail tool server
#[derive(Debug)]
pub struct AuthServer {
    child: Option<Child>,
}

impl AuthServer {
    /// Kill stale instances, spawn a fresh one and make sure it stays up
    pub async fn start() -> Result<Self> {
        // No stale instance is the normal case
        let _ = Command::new("pkill")
            .args(["-f", STALE_AUTH_PATTERN])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let mut command = Command::new("npx");
        command.args([GMAIL_PACKAGE, "auth"]);
        Self::launch(command).await
    }

    async fn launch(mut command: Command) -> Result<Self> {
        tracing::info!("[Gmail] Starting auth server");
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn the Gmail auth server")?;

        sleep(STARTUP_GRACE).await;

        if let Some(status) = child.try_wait()? {
            let output = child.wait_with_output().await?;
            bail!(
                "Server failed to start ({})\nstdout: {}\nstderr: {}",
                status,
                String::from_utf8_lossy(&output.stdout).trim(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // Keep the pipes flowing so a chatty server never blocks on a full buffer
        if let Some(stdout) = child.stdout.take() {
            drain_output("stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            drain_output("stderr", stderr);
        }

        Ok(Self { child: Some(child) })
    }

    /// Terminate the server, waiting briefly for it to exit
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        tracing::info!("[Gmail] Stopping auth server");
        if let Err(e) = child.start_kill() {
            tracing::debug!("[Gmail] Auth server already gone: {}", e);
        }
        if timeout(STOP_TIMEOUT, child.wait()).await.is_err() {
            tracing::warn!("[Gmail] Auth server did not exit within {:?}", STOP_TIMEOUT);
        }
    }

    /// Stop and start again, clearing the server's session
    pub async fn restart(&mut self) -> Result<()> {
        self.stop().await;
        *self = Self::start().await?;
        Ok(())
    }
}

fn drain_output<R>(stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!("[Gmail] auth server {}: {}", stream, line);
        }
    });
}

/// Poll `addr` until it accepts a TCP connection or `limit` elapses
pub async fn wait_until_ready(addr: &str, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        match timeout(READY_POLL_INTERVAL, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => return true,
            Ok(Err(e)) => {
                tracing::debug!("[Gmail] {} not ready: {}", addr, e);
                sleep(READY_POLL_INTERVAL).await;
            }
            Err(_) => {}
        }
    }
    false
}

/// Directory where the Gmail tool server keeps its credentials
pub fn config_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.gmail-mcp").into_owned())
}

/// OAuth client keys downloaded from Google Cloud Console
pub fn credentials_path() -> PathBuf {
    config_dir().join("gcp-oauth.keys.json")
}

/// Token written after a successful login
pub fn token_path() -> PathBuf {
    config_dir().join("token.json")
}

/// Delete the stored token; `false` when there was none
pub fn remove_token(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Forget the current account and restart the auth server
pub async fn logout(server: &mut AuthServer) -> Result<()> {
    let removed = remove_token(&token_path())?;
    tracing::info!("[Gmail] Logged out (token removed: {})", removed);
    server.restart().await
}

pub fn repl_options() -> ReplOptions {
    ReplOptions::new("Gmail Management Assistant")
        .with_initial_prompt(INITIAL_PROMPT)
        .with_logout_words(LOGOUT_WORDS)
        .with_farewell("Thank you for using the Gmail assistant!")
}

/// Ask whether to continue without OAuth credentials; anything but `y` declines
async fn confirm_without_credentials<I: InputSource>(console: &Console, input: &mut I) -> Result<bool> {
    console.println();
    console.print_plain("OAuth credentials not found. Please ensure you have:");
    console.print_plain("1. Created OAuth credentials in Google Cloud Console");
    console.print_plain("2. Downloaded the credentials as JSON");
    console.print_plain(&format!("3. Placed the file at: {}", credentials_path().display()));
    console.println();
    console.print_plain("Would you like to proceed with authentication anyway? (y/n)");

    let answer = input.read_line().await?.unwrap_or_default();
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_troubleshooting(console: &Console, error: &str) {
    console.println();
    console.print_separator();
    console.print_plain("Authentication Error");
    console.print_separator();
    console.print_error(error);
    console.println();
    console.print_plain("Troubleshooting steps:");
    for step in TROUBLESHOOTING {
        console.print_plain(step);
    }
}

/// Authenticate, run the REPL, and start over after each logout
pub async fn run_session<I: InputSource>(
    backend: Arc<dyn ChatBackend>,
    server: &mut AuthServer,
    input: &mut I,
) -> Result<()> {
    let console = Console::new();

    loop {
        if !credentials_path().exists() && !confirm_without_credentials(&console, input).await? {
            return Ok(());
        }

        console.println();
        console.print_system("Starting Gmail authentication...");
        console.print_plain("The browser will open automatically for Google authentication.");
        console.print_plain("Please make sure your browser can access localhost:3000");
        console.print_system("Waiting for authentication server to start...");

        if !wait_until_ready(AUTH_ADDR, READY_TIMEOUT).await {
            print_troubleshooting(&console, "Authentication server failed to start");
            bail!("Gmail auth server at {} never became ready", AUTH_ADDR);
        }

        let history = History::new();
        if let Err(e) = backend.respond(AUTH_PROMPT, &history).await {
            let message = format!("Authentication setup failed: {:#}", e);
            tracing::error!("[Gmail] {}", message);
            print_troubleshooting(&console, &message);
            return Err(e.context("Gmail authentication failed"));
        }
        console.print_system("Authentication process started. Please complete the authentication in your browser.");

        match backend.respond(ACCOUNT_PROMPT, &history).await {
            Ok(account) => {
                tracing::info!("[Gmail] Gmail address retrieved: {}", account.output.trim());
                console.println();
                console.print_separator();
                console.print_plain("✓ Successfully authenticated!");
                console.print_plain(&format!("📧 Active Gmail account: {}", account.output.trim()));
                console.print_separator();
            }
            Err(e) => {
                tracing::warn!("[Gmail] Failed to retrieve Gmail address: {:#}", e);
                console.print_plain("Authenticated successfully, but couldn't retrieve email address.");
            }
        }

        let mut repl = Repl::new(backend.clone(), repl_options());
        match repl.run(input).await? {
            ExitReason::Logout => {
                console.print_system("Disconnecting current Gmail account...");
                if let Err(e) = logout(server).await {
                    console.print_error(&format!("Failed to restart Gmail server. Please restart the application. ({:#})", e));
                    return Err(e);
                }
                console.print_system("Successfully disconnected. Please authenticate with a different account.");
            }
            _ => return Ok(()),
        }
    }
}
