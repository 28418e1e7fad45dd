// ============================================================================
// Stockage local : Persistence Adapter
// ============================================================================
// Persiste la watchlist sous une seule clé ("watchlistData") en JSON
//
// CONCEPTS RUST :
// 1. Traits : KeyValueStore abstrait le support (fichier ou mémoire)
// 2. Generics : WatchlistStorage<S> fonctionne avec n'importe quel store
// 3. Tolérance : toute erreur de lecture/parsing = watchlist vide
// ============================================================================

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Clé sous laquelle la watchlist est persistée
pub const WATCHLIST_KEY: &str = "watchlistData";

// ============================================================================
// Trait KeyValueStore
// ============================================================================
// CONCEPT RUST : Trait comme interface
// - FileStore : un fichier JSON par clé dans le répertoire de données
// - MemoryStore : HashMap partagée (tests, sessions éphémères)
// - Clone : le Store et le PortfolioView lisent le même support
// ============================================================================

/// Stockage clé/valeur local (équivalent du localStorage d'un navigateur)
pub trait KeyValueStore: Clone {
    /// Lit la valeur brute d'une clé (None si absente)
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Écrit la valeur brute d'une clé
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Stockage sur disque : `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Crée le store (le répertoire est créé à la première écriture)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Échec de la lecture de {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Échec de la création de {}", self.dir.display()))?;

        // Écriture dans un fichier temporaire puis rename :
        // un autre processus ne lit jamais un fichier à moitié écrit
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .with_context(|| format!("Échec de l'écriture de {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Échec du remplacement de {}", path.display()))?;

        Ok(())
    }
}

/// Stockage en mémoire, partagé entre tous les clones
///
/// CONCEPT RUST : Arc<Mutex<>>
/// - Arc : plusieurs propriétaires (Store + PortfolioView)
/// - Mutex : accès exclusif pendant la lecture/écriture
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("MemoryStore verrouillé (mutex empoisonné)"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("MemoryStore verrouillé (mutex empoisonné)"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// WatchlistStorage : lecture/écriture typée de la clé "watchlistData"
// ============================================================================

/// Adaptateur de persistance pour la watchlist
#[derive(Debug, Clone)]
pub struct WatchlistStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> WatchlistStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Valeur brute actuellement persistée (utilisée pour détecter les
    /// modifications faites par un autre processus)
    pub fn raw(&self) -> Option<String> {
        match self.store.get(WATCHLIST_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = ?e, "Failed to read persisted watchlist");
                None
            }
        }
    }

    /// Lit la watchlist persistée
    ///
    /// Absente, vide ou invalide : retourne une liste vide (jamais d'erreur).
    pub fn load<T: DeserializeOwned>(&self) -> Vec<T> {
        match self.raw() {
            Some(raw) => parse_rows(&raw),
            None => Vec::new(),
        }
    }

    /// Remplace la watchlist persistée
    pub fn save<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        let json = serde_json::to_string(rows).context("Échec de la sérialisation de la watchlist")?;
        self.store.set(WATCHLIST_KEY, &json)?;
        debug!(rows = rows.len(), "Persisted watchlist");
        Ok(())
    }
}

/// Parse un contenu brut en liste de lignes ; tout échec donne une liste vide
pub fn parse_rows<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Persisted watchlist is malformed, treating as empty");
            Vec::new()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token_row::sample_row;
    use crate::models::TokenRow;
    use crate::store::random_holdings;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tokenfolio-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set(WATCHLIST_KEY, "[]").unwrap();
        assert_eq!(other.get(WATCHLIST_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_load_absent_is_empty() {
        let storage = WatchlistStorage::new(MemoryStore::new());
        let rows: Vec<TokenRow> = storage.load();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_load_empty_string_and_malformed_is_empty() {
        let store = MemoryStore::new();
        let storage = WatchlistStorage::new(store.clone());

        store.set(WATCHLIST_KEY, "").unwrap();
        assert!(storage.load::<TokenRow>().is_empty());

        store.set(WATCHLIST_KEY, "{not json").unwrap();
        assert!(storage.load::<TokenRow>().is_empty());

        store.set(WATCHLIST_KEY, r#"{"id":"btc"}"#).unwrap();
        assert!(storage.load::<TokenRow>().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let storage = WatchlistStorage::new(MemoryStore::new());
        let rows = vec![sample_row("btc", 2.0, 50_000.0), sample_row("eth", 10.0, 2_000.0)];

        storage.save(&rows).unwrap();
        let loaded: Vec<TokenRow> = storage.load();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_reloaded_rows_are_bit_identical() {
        // Holdings aléatoires à 4 décimales et prix non représentables
        // exactement : la relecture doit redonner exactement les mêmes f64
        let storage = WatchlistStorage::new(MemoryStore::new());

        for i in 0..2000 {
            let h = random_holdings();
            let rows = vec![sample_row(&format!("t{}", i), h, 0.1 + h / 7.0)];

            storage.save(&rows).unwrap();
            let loaded: Vec<TokenRow> = storage.load();
            assert_eq!(loaded, rows);
            assert_eq!(loaded[0].value.map(f64::to_bits), rows[0].value.map(f64::to_bits));
        }
    }

    #[test]
    fn test_file_store_roundtrip_and_missing_file() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);

        assert!(store.get(WATCHLIST_KEY).unwrap().is_none());

        store.set(WATCHLIST_KEY, "[1,2]").unwrap();
        assert_eq!(store.get(WATCHLIST_KEY).unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.join("watchlistData.json").exists());
        assert!(!dir.join("watchlistData.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
