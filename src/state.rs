use std::sync::Arc;

use crate::config::Config;
use crate::fanout::Fanout;
use crate::identity::{IdentityProvider, InMemoryDirectory};
use crate::services::{
    ConversationService, MessageService, PresenceService, ReactionService, ReceiptService,
};
use crate::store::{BlobStore, ChatStore, MemoryBlobStore, MemoryStore};

/// Every component is an explicit instance with its collaborators injected;
/// there are no global singletons, so tests can wire doubles freely.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ChatStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub conversations: Arc<ConversationService>,
    pub messages: Arc<MessageService>,
    pub receipts: Arc<ReceiptService>,
    pub reactions: Arc<ReactionService>,
    pub presence: Arc<PresenceService>,
    pub fanout: Arc<Fanout>,
}

impl AppState {
    /// Wires the full component graph against in-memory collaborators.
    pub fn in_memory(config: Config) -> Self {
        let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new());
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let identity: Arc<dyn IdentityProvider> = directory.clone();

        let conversations = Arc::new(ConversationService::new(store.clone(), identity));
        let messages = Arc::new(MessageService::new(
            store.clone(),
            conversations.clone(),
            config.preview_max_chars,
        ));
        let receipts = Arc::new(ReceiptService::new(store.clone()));
        let reactions = Arc::new(ReactionService::new(store.clone()));
        let presence = Arc::new(PresenceService::new(store.clone(), config.typing_window));
        let fanout = Arc::new(Fanout::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            blobs,
            directory,
            conversations,
            messages,
            receipts,
            reactions,
            presence,
            fanout,
        }
    }
}
