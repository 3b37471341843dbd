//! Command handlers module for the RAX FTPS server.
//!
//! One entry point, [`handle_command`], takes a raw control line through
//! parsing, the login gate, the role policy and argument checks before
//! running the matching handler. Every path ends in exactly one terminal
//! reply (or 227/150/226 for transfers).

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::auth::{allowed, validate_password, validate_user};
use crate::error::{
    AuthError, ProtocolError, StorageError, ToReply, TransferError, TransportError,
};
use crate::navigate::{change_directory, change_to_parent};
use crate::protocol::responses::{
    ACTION_OK, DATA_CONNECTION_OPENING, GOODBYE, LOGIN_SUCCESS, PASSWORD_REQUIRED, PATH_CREATED,
    TRANSFER_COMPLETE,
};
use crate::protocol::{Command, Reply, Verb, parse_command};
use crate::server::ServerContext;
use crate::session::Session;
use crate::storage::validation::is_plain_file_name;
use crate::storage::{ResolvedPath, render_listing};
use crate::transfer::{DataConnection, PassiveDataChannel, copy_in_chunks, send_in_chunks};
use crate::transport::ControlConnection;

/// What the session loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Continue,
    CloseConnection,
}

/// Processes one control line.
///
/// Only transport failures on the control channel are returned as errors;
/// everything else becomes a reply and the session continues.
pub async fn handle_command<S>(
    session: &mut Session,
    raw: &str,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
) -> Result<CommandStatus, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!("[{}] <- {}", session.peer_addr(), mask_password(raw));

    let line = match parse_command(raw) {
        Ok(line) => line,
        Err(e) => {
            session.take_pending_user();
            conn.send(&e.to_reply()).await?;
            return Ok(CommandStatus::Continue);
        }
    };

    let verb = Verb::from_token(&line.verb);

    // PASS must directly follow USER.
    if verb != Some(Verb::Pass) && session.has_pending_user() {
        debug!(
            "[{}] Pending login dropped by {}",
            session.peer_addr(),
            line.verb
        );
        session.take_pending_user();
    }
    if !session.is_authenticated() && verb.is_none_or(Verb::requires_auth) {
        debug!(
            "[{}] {} rejected before login",
            session.peer_addr(),
            line.verb
        );
        conn.send(&Reply::not_logged_in()).await?;
        return Ok(CommandStatus::Continue);
    }

    let Some(verb) = verb else {
        conn.send(&ProtocolError::UnknownCommand(line.verb).to_reply())
            .await?;
        return Ok(CommandStatus::Continue);
    };

    if let Some(role) = session.role() {
        if !allowed(role, verb) {
            warn!(
                "[{}] {} denied for {} ({})",
                session.peer_addr(),
                verb.as_str(),
                session.username().unwrap_or("?"),
                role
            );
            conn.send(&Reply::not_allowed()).await?;
            return Ok(CommandStatus::Continue);
        }
    }

    let command = match Command::from_line(verb, &line) {
        Ok(command) => command,
        Err(e) => {
            conn.send(&e.to_reply()).await?;
            return Ok(CommandStatus::Continue);
        }
    };

    execute(session, command, ctx, conn).await
}

async fn execute<S>(
    session: &mut Session,
    command: Command,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
) -> Result<CommandStatus, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match command {
        Command::User(username) => handle_cmd_user(session, ctx, username),
        Command::Pass(password) => handle_cmd_pass(session, ctx, &password),
        Command::Pwd => Reply::new(
            PATH_CREATED,
            format!("\"{}\" is the current directory.", session.current_dir()),
        ),
        Command::Cwd(path) => handle_cmd_cwd(session, ctx, &path).await,
        Command::Cdup => handle_cmd_cdup(session, ctx).await,
        Command::Mkd(path) => match ctx.store.make_directory(session.current_dir(), &path).await {
            Ok(created) => Reply::new(PATH_CREATED, format!("\"{created}\" directory created.")),
            Err(e) => e.to_reply(),
        },
        Command::Rmd(path) => match ctx.store.remove_directory(session.current_dir(), &path).await {
            Ok(_) => Reply::new(ACTION_OK, "Directory deleted successfully."),
            Err(e) => e.to_reply(),
        },
        Command::Dele(path) => match delete_file(session, ctx, &path).await {
            Ok(_) => Reply::new(ACTION_OK, "File deleted successfully."),
            Err(e) => e.to_reply(),
        },
        Command::List(path) => {
            handle_cmd_list(session, ctx, conn, path.as_deref()).await?;
            return Ok(CommandStatus::Continue);
        }
        Command::Retr(path) => {
            handle_cmd_retr(session, ctx, conn, &path).await?;
            return Ok(CommandStatus::Continue);
        }
        Command::Stor { filename, dest_dir } => {
            let dest_dir = dest_dir.unwrap_or_else(|| ctx.upload_dir.clone());
            handle_cmd_stor(session, ctx, conn, &filename, &dest_dir).await?;
            return Ok(CommandStatus::Continue);
        }
        Command::Quit => {
            info!("[{}] QUIT", session.peer_addr());
            session.logout();
            conn.send(&Reply::new(GOODBYE, "Goodbye.")).await?;
            return Ok(CommandStatus::CloseConnection);
        }
    };

    conn.send(&reply).await?;
    Ok(CommandStatus::Continue)
}

/// Validates the username. Any earlier login is dropped either way.
fn handle_cmd_user(session: &mut Session, ctx: &ServerContext, username: String) -> Reply {
    match validate_user(ctx.credentials.as_ref(), &username) {
        Ok(()) => {
            session.begin_login(username);
            Reply::new(
                PASSWORD_REQUIRED,
                "Username accepted, please enter your password.",
            )
        }
        Err(e) => {
            warn!("[{}] USER rejected: {}", session.peer_addr(), e);
            session.logout();
            e.to_reply()
        }
    }
}

/// Checks the password for the pending username, consuming it.
fn handle_cmd_pass(session: &mut Session, ctx: &ServerContext, password: &str) -> Reply {
    let Some(username) = session.take_pending_user() else {
        return AuthError::NoPendingUser.to_reply();
    };

    match validate_password(ctx.credentials.as_ref(), &username, password) {
        Ok(role) => {
            info!(
                "[{}] User {} logged in with role {}",
                session.peer_addr(),
                username,
                role
            );
            let text = format!("Login successful. Logged in as {username} with role {role}.");
            session.complete_login(username, role);
            Reply::new(LOGIN_SUCCESS, text)
        }
        Err(e) => {
            warn!("[{}] Login failed for {}: {}", session.peer_addr(), username, e);
            e.to_reply()
        }
    }
}

async fn handle_cmd_cwd(session: &mut Session, ctx: &ServerContext, path: &str) -> Reply {
    match change_directory(&ctx.store, session.current_dir(), path).await {
        Ok(new_dir) => {
            let reply = Reply::new(
                ACTION_OK,
                format!("Directory successfully changed to {new_dir}."),
            );
            session.set_current_dir(new_dir);
            reply
        }
        Err(e) => {
            debug!("[{}] CWD {} failed: {}", session.peer_addr(), path, e);
            e.to_reply()
        }
    }
}

async fn handle_cmd_cdup(session: &mut Session, ctx: &ServerContext) -> Reply {
    match change_to_parent(&ctx.store, session.current_dir()).await {
        Ok(parent) => {
            session.set_current_dir(parent);
            Reply::new(ACTION_OK, "Successfully changed to parent directory.")
        }
        Err(e) => e.to_reply(),
    }
}

/// Reads the listing first so errors are reported without a data channel.
async fn handle_cmd_list<S>(
    session: &Session,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
    path: Option<&str>,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let entries = match ctx.store.list_directory(session.current_dir(), path).await {
        Ok(entries) => entries,
        Err(e) => return conn.send(&e.to_reply()).await,
    };
    let listing = render_listing(&entries);

    let Some(mut data) = open_data_connection(session, ctx, conn).await? else {
        return Ok(());
    };
    let result = send_in_chunks(data.stream_mut(), listing.as_bytes(), ctx.buffer_size).await;
    finish_transfer(session, conn, data, result, "LIST").await
}

async fn handle_cmd_retr<S>(
    session: &Session,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
    path: &str,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target = match locate_file(session, ctx, path).await {
        Ok(target) => target,
        Err(e) => return conn.send(&e.to_reply()).await,
    };

    let Some(mut data) = open_data_connection(session, ctx, conn).await? else {
        return Ok(());
    };
    let mut reader = match ctx.store.open_reader(&target).await {
        Ok(reader) => reader,
        Err(e) => {
            error!("[{}] Cannot open {}: {}", session.peer_addr(), target.virtual_path, e);
            drop(data);
            return conn.send(&e.to_reply()).await;
        }
    };

    let result = copy_in_chunks(reader.file_mut(), data.stream_mut(), ctx.buffer_size).await;
    drop(reader);
    finish_transfer(session, conn, data, result, &target.virtual_path).await
}

async fn handle_cmd_stor<S>(
    session: &Session,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
    filename: &str,
    dest_dir: &str,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target = match ctx
        .store
        .prepare_storage(session.current_dir(), filename, dest_dir)
        .await
    {
        Ok(target) => target,
        Err(e) => return conn.send(&e.to_reply()).await,
    };

    let Some(mut data) = open_data_connection(session, ctx, conn).await? else {
        return Ok(());
    };
    let mut writer = match ctx.store.open_writer(&target).await {
        Ok(writer) => writer,
        Err(e) => {
            error!("[{}] Cannot create {}: {}", session.peer_addr(), target.virtual_path, e);
            drop(data);
            return conn.send(&e.to_reply()).await;
        }
    };

    let result = copy_in_chunks(data.stream_mut(), writer.file_mut(), ctx.buffer_size).await;
    drop(writer);
    finish_transfer(session, conn, data, result, &target.virtual_path).await
}

/// The same bare file name inside the default upload directory.
///
/// RETR and DELE fall back to it when the name is missing from the session
/// directory, so a file stored without choosing a place can be found again.
fn upload_dir_candidate(ctx: &ServerContext, path: &str) -> Option<String> {
    is_plain_file_name(path)
        .then(|| format!("{}/{}", ctx.upload_dir.trim_end_matches('/'), path))
}

/// Reports a failed fallback as the original miss.
fn restore_miss(err: StorageError, missing: String) -> StorageError {
    match err {
        StorageError::FileNotFound(_) => StorageError::FileNotFound(missing),
        other => other,
    }
}

async fn locate_file(
    session: &Session,
    ctx: &ServerContext,
    path: &str,
) -> Result<ResolvedPath, StorageError> {
    let cwd = session.current_dir();
    match ctx.store.prepare_retrieval(cwd, path).await {
        Err(StorageError::FileNotFound(missing)) => match upload_dir_candidate(ctx, path) {
            Some(candidate) => ctx
                .store
                .prepare_retrieval(cwd, &candidate)
                .await
                .map_err(|e| restore_miss(e, missing)),
            None => Err(StorageError::FileNotFound(missing)),
        },
        other => other,
    }
}

async fn delete_file(
    session: &Session,
    ctx: &ServerContext,
    path: &str,
) -> Result<String, StorageError> {
    let cwd = session.current_dir();
    match ctx.store.delete_file(cwd, path).await {
        Err(StorageError::FileNotFound(missing)) => match upload_dir_candidate(ctx, path) {
            Some(candidate) => ctx
                .store
                .delete_file(cwd, &candidate)
                .await
                .map_err(|e| restore_miss(e, missing)),
            None => Err(StorageError::FileNotFound(missing)),
        },
        other => other,
    }
}

/// Announces a passive channel and waits for the client.
///
/// Sends 227, then 150 once the client is connected. On failure the 425
/// reply has already been sent and `None` is returned.
async fn open_data_connection<S>(
    session: &Session,
    ctx: &ServerContext,
    conn: &mut ControlConnection<S>,
) -> Result<Option<DataConnection>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let channel = match PassiveDataChannel::open(ctx.bind_ip, ctx.passive_ip).await {
        Ok(channel) => channel,
        Err(e) => {
            error!("[{}] {}", session.peer_addr(), e);
            conn.send(&e.to_reply()).await?;
            return Ok(None);
        }
    };
    conn.send(&channel.passive_reply()).await?;

    let expected_peer = Some(session.peer_addr().ip());
    match channel
        .accept(&ctx.acceptor, expected_peer, ctx.data_accept_timeout)
        .await
    {
        Ok(data) => {
            conn.send(&Reply::new(
                DATA_CONNECTION_OPENING,
                "Opening data connection.",
            ))
            .await?;
            Ok(Some(data))
        }
        Err(e) => {
            warn!("[{}] {}", session.peer_addr(), e);
            conn.send(&e.to_reply()).await?;
            Ok(None)
        }
    }
}

/// Closes the data connection and sends 226, or 426 if the copy failed.
async fn finish_transfer<S>(
    session: &Session,
    conn: &mut ControlConnection<S>,
    data: DataConnection,
    result: std::io::Result<u64>,
    what: &str,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match result {
        Ok(bytes) => {
            let data_peer = data.peer_addr();
            // A peer that already closed its side may refuse close_notify.
            if let Err(e) = data.finish().await {
                debug!("[{}] Data channel close: {}", session.peer_addr(), e);
            }
            info!(
                "[{}] Transfer of {} complete ({} bytes via {})",
                session.peer_addr(),
                what,
                bytes,
                data_peer
            );
            conn.send(&Reply::new(TRANSFER_COMPLETE, "Transfer complete."))
                .await
        }
        Err(e) => {
            error!("[{}] Transfer of {} aborted: {}", session.peer_addr(), what, e);
            drop(data);
            conn.send(&TransferError::Io(e).to_reply()).await
        }
    }
}

/// Hides the password of a PASS line for logging.
fn mask_password(raw: &str) -> String {
    let trimmed = raw.trim_start();
    match trimmed.get(..4) {
        Some(verb) if verb.eq_ignore_ascii_case("PASS") => "PASS ****".to_string(),
        _ => raw.trim_end().to_string(),
    }
}
