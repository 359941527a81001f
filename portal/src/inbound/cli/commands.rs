//! Command dispatch.

use std::io::Write;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::domain::ports::{KeyValueStore, LoginService, ObjectStorage};
use crate::domain::{
    AttachmentPayload, Document, DocumentId, Error, LoginCredentials, NewUser, PublishRequest,
    StoragePreference, decode_data_uri,
};

use super::args::{AddDocumentArgs, Command, DocumentsCommand, StorageCommand, UsersCommand};
use super::files::{read_upload, write_export};
use super::{CliError, Portal};

/// Execute `command`, writing human-readable output to `out`.
pub async fn run<K, S, W>(portal: &Portal<K, S>, command: Command, out: &mut W) -> Result<(), CliError>
where
    K: KeyValueStore + 'static,
    S: ObjectStorage,
    W: Write,
{
    match command {
        Command::Login(args) => {
            let credentials = LoginCredentials::try_from_parts(&args.username, &args.password)
                .map_err(|err| Error::invalid_request(err.to_string()))?;
            let user = portal.directory.authenticate(&credentials).await?;
            let session = portal.sessions.login(&user).await?;
            writeln!(out, "logged in as {} ({})", session.username, session.role)?;
        }
        Command::Logout => {
            portal.sessions.logout().await?;
            writeln!(out, "logged out")?;
        }
        Command::Whoami => match portal.sessions.current().await {
            Some(session) => writeln!(out, "{} ({})", session.username, session.role)?,
            None => writeln!(out, "not logged in")?,
        },
        Command::Users(command) => users(portal, command, out).await?,
        Command::Documents(command) => documents(portal, command, out).await?,
        Command::Storage(StorageCommand::Check) => {
            portal.sessions.require_admin().await?;
            let remote = portal.publisher.remote()?;
            let report = remote.check_connection().await.map_err(Error::from)?;
            writeln!(
                out,
                "bucket {} reachable ({}, {} bucket(s) visible)",
                report.bucket,
                if report.bucket_public { "public" } else { "private" },
                report.total_buckets
            )?;
        }
    }
    Ok(())
}

async fn users<K, S, W>(portal: &Portal<K, S>, command: UsersCommand, out: &mut W) -> Result<(), CliError>
where
    K: KeyValueStore + 'static,
    S: ObjectStorage,
    W: Write,
{
    let actor = portal.sessions.require().await?;
    match command {
        UsersCommand::Add {
            username,
            password,
            role,
        } => {
            let new_user = NewUser::try_from_parts(&username, &password, role)
                .map_err(|err| Error::invalid_request(err.to_string()))?;
            let user = portal.directory.add_user(actor.role, new_user).await?;
            writeln!(out, "added {} ({}) {}", user.username(), user.role(), user.id())?;
        }
        UsersCommand::List => {
            crate::domain::ensure_admin(actor.role)?;
            for user in portal.directory.list().await? {
                writeln!(out, "{}\t{}\t{}", user.id(), user.username(), user.role())?;
            }
        }
    }
    Ok(())
}

async fn documents<K, S, W>(
    portal: &Portal<K, S>,
    command: DocumentsCommand,
    out: &mut W,
) -> Result<(), CliError>
where
    K: KeyValueStore + 'static,
    S: ObjectStorage,
    W: Write,
{
    let session = portal.sessions.require().await?;
    let store = portal.store();
    match command {
        DocumentsCommand::List => print_documents(&store.list().await, out)?,
        DocumentsCommand::Show { id, export } => {
            let id = DocumentId::new(id).map_err(|err| Error::invalid_request(err.to_string()))?;
            let document = store
                .get(&id)
                .await
                .ok_or_else(|| Error::not_found(format!("no document with id {id}")))?;
            print_document(&document, out)?;
            if let Some(path) = export {
                let bytes = local_bytes(&document)?;
                write_export(&path, &bytes)?;
                writeln!(out, "exported {} bytes to {}", bytes.len(), path.display())?;
            }
        }
        DocumentsCommand::Add(args) => {
            let request = publish_request(args)?;
            let outcome = portal.publisher.publish(session.role, request).await?;
            if let Some(reason) = &outcome.fallback_reason {
                writeln!(out, "remote upload failed, stored inline instead: {reason}")?;
            }
            writeln!(out, "created {}", outcome.document.id)?;
        }
        DocumentsCommand::Remove { id } => {
            let id = DocumentId::new(id).map_err(|err| Error::invalid_request(err.to_string()))?;
            if portal.publisher.unpublish(session.role, &id).await? {
                writeln!(out, "removed {id}")?;
            } else {
                writeln!(out, "no document with id {id}")?;
            }
        }
        DocumentsCommand::Reset => {
            crate::domain::ensure_admin(session.role)?;
            store.reset_to_default().await;
            writeln!(out, "documents reset to defaults")?;
        }
        DocumentsCommand::EnsureSeed => {
            crate::domain::ensure_admin(session.role)?;
            if store.ensure_seed_document_exists().await {
                writeln!(out, "certificate document restored")?;
            } else {
                writeln!(out, "certificate document already present")?;
            }
        }
        DocumentsCommand::Watch {
            interval_secs,
            max_changes,
        } => watch(portal, interval_secs, max_changes, out).await?,
    }
    Ok(())
}

fn publish_request(args: AddDocumentArgs) -> Result<PublishRequest, CliError> {
    let file = args
        .file
        .as_deref()
        .map(|path| read_upload(path, args.mime_type.clone()))
        .transpose()?;
    Ok(PublishRequest {
        title: args.title,
        content: args.content,
        created_at: args.date,
        file,
        storage: if args.remote {
            StoragePreference::Remote
        } else {
            StoragePreference::Local
        },
    })
}

fn local_bytes(document: &Document) -> Result<Vec<u8>, Error> {
    match document.attachment.as_ref().map(|file| &file.payload) {
        Some(AttachmentPayload::Local { data, .. }) => {
            let (_, bytes) = decode_data_uri(data)?;
            Ok(bytes)
        }
        Some(_) => Err(Error::invalid_request(
            "only inline attachments can be exported; fetch others from their URL",
        )),
        None => Err(Error::not_found("document has no attachment")),
    }
}

/// Print the collection until `max_changes` changes were seen.
///
/// In-process notifications wake the loop immediately; the interval re-read
/// catches writes made by other processes.
async fn watch<K, S, W>(
    portal: &Portal<K, S>,
    interval_secs: u64,
    max_changes: Option<usize>,
    out: &mut W,
) -> Result<(), CliError>
where
    K: KeyValueStore + 'static,
    S: ObjectStorage,
    W: Write,
{
    let store = portal.store();
    let mut subscription = store.subscribe();
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut snapshot = store.list().await;
    print_documents(&snapshot, out)?;
    out.flush()?;

    let mut changes = 0_usize;
    while max_changes.is_none_or(|max| changes < max) {
        tokio::select! {
            alive = subscription.changed() => {
                if !alive {
                    break;
                }
            }
            _ = interval.tick() => {}
        }
        let current = store.list().await;
        if current != snapshot {
            changes += 1;
            info!(count = current.len(), "documents changed");
            writeln!(out, "-- documents changed --")?;
            print_documents(&current, out)?;
            out.flush()?;
            snapshot = current;
        }
    }
    Ok(())
}

fn print_documents(documents: &[Document], out: &mut impl Write) -> std::io::Result<()> {
    if documents.is_empty() {
        return writeln!(out, "no documents");
    }
    for document in documents {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            document.id,
            document.created_at,
            document
                .attachment
                .as_ref()
                .map_or("-", |file| file.storage_kind().as_str()),
            document.title
        )?;
    }
    Ok(())
}

fn print_document(document: &Document, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "id:      {}", document.id)?;
    writeln!(out, "title:   {}", document.title)?;
    writeln!(out, "created: {}", document.created_at)?;
    if let Some(file) = &document.attachment {
        writeln!(
            out,
            "file:    {} ({}, {} bytes, {})",
            file.name,
            file.mime_type,
            file.size,
            file.storage_kind()
        )?;
        match &file.payload {
            AttachmentPayload::RemoteObjectStore { url, .. } => writeln!(out, "url:     {url}")?,
            AttachmentPayload::BundledAsset { path } => writeln!(out, "asset:   {path}")?,
            AttachmentPayload::Local {
                compressed: true,
                original_size,
                ..
            } => writeln!(
                out,
                "note:    whitespace collapsed from {} bytes",
                original_size.unwrap_or(file.size)
            )?,
            AttachmentPayload::Local { .. } => {}
        }
    }
    writeln!(out)?;
    writeln!(out, "{}", document.content)
}
