//! JSON file storage implementation.
//!
//! Stores data as JSON files under a root directory (`.studyplan` by default):
//!
//! - `topics/<upload_id>.json` holds the ordered topic list of an upload
//! - `plans/<plan_id>.json` holds one persisted plan
//! - `progress/<user>.json` holds every progress record of one user

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studyplan_core::{PlanId, PlanRecord, ProgressRecord, Topic, TopicId, UploadId, UserId};
use super::{Storage, StorageError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// File-based JSON storage backend.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStorage {
    /// Create storage, creating the data directories under `root` if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("topics")).await?;
        fs::create_dir_all(root.join("plans")).await?;
        fs::create_dir_all(root.join("progress")).await?;

        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn topics_path(&self, id: UploadId) -> PathBuf {
        self.root.join("topics").join(format!("{}.json", id))
    }
    fn plan_path(&self, id: PlanId) -> PathBuf {
        self.root.join("plans").join(format!("{}.json", id))
    }
    fn progress_path(&self, user_id: &UserId) -> Result<PathBuf> {
        Ok(self.root.join("progress").join(format!("{}.json", file_key(user_id)?)))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_topics(&self, upload_id: UploadId, topics: &[Topic]) -> Result<()> {
        let mut ordered = topics.to_vec();
        ordered.sort_by_key(|t| t.sequence_order);

        let _guard = self.write_lock.lock().await;
        write_json(&self.topics_path(upload_id), &ordered).await?;
        debug!(upload = %upload_id, count = ordered.len(), "saved topics");
        Ok(())
    }

    async fn list_topics(&self, upload_id: UploadId) -> Result<Vec<Topic>> {
        let mut topics: Vec<Topic> = read_json(&self.topics_path(upload_id))
            .await?
            .unwrap_or_default();
        topics.sort_by_key(|t| t.sequence_order);
        Ok(topics)
    }

    async fn save_plan(&self, record: &PlanRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.plan_path(record.id), record).await?;
        debug!(plan = %record.id, user = %record.user_id, "saved plan");
        Ok(())
    }

    async fn load_plan(&self, id: PlanId) -> Result<Option<PlanRecord>> {
        read_json(&self.plan_path(id)).await
    }

    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<PlanRecord>> {
        let all: Vec<PlanRecord> = list_dir(&self.root.join("plans")).await?;
        let mut plans: Vec<PlanRecord> = all
            .into_iter()
            .filter(|p| &p.user_id == user_id)
            .collect();
        plans.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
        });
        Ok(plans)
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<()> {
        let path = self.progress_path(&record.user_id)?;

        let _guard = self.write_lock.lock().await;
        let mut records = read_progress(&path, &record.user_id).await?;
        put(&mut records, record.clone());
        write_json(&path, &records).await
    }

    async fn upsert_progress<F, E>(
        &self,
        user_id: &UserId,
        topic_id: TopicId,
        apply: F,
    ) -> std::result::Result<ProgressRecord, E>
    where
        F: FnOnce(Option<ProgressRecord>) -> std::result::Result<ProgressRecord, E> + Send,
        E: From<StorageError> + Send,
    {
        let path = self.progress_path(user_id)?;

        let _guard = self.write_lock.lock().await;
        let mut records = read_progress(&path, user_id).await?;
        let current = records.iter().find(|r| r.topic_id == topic_id).cloned();
        let updated = apply(current)?;
        if updated.user_id != *user_id || updated.topic_id != topic_id {
            return Err(StorageError::Other(format!(
                "upsert for {}/{} returned record for {}/{}",
                user_id, topic_id, updated.user_id, updated.topic_id
            ))
            .into());
        }
        put(&mut records, updated.clone());
        write_json(&path, &records).await?;
        Ok(updated)
    }

    async fn seed_progress(&self, user_id: &UserId, topic_ids: &[TopicId]) -> Result<usize> {
        let path = self.progress_path(user_id)?;

        let _guard = self.write_lock.lock().await;
        let mut records = read_progress(&path, user_id).await?;
        let mut known: HashSet<TopicId> = records.iter().map(|r| r.topic_id).collect();
        let mut seeded = 0;
        for &topic_id in topic_ids {
            if known.insert(topic_id) {
                records.push(ProgressRecord::new(user_id.clone(), topic_id));
                seeded += 1;
            }
        }
        if seeded > 0 {
            write_json(&path, &records).await?;
        }
        debug!(user = %user_id, seeded, "seeded progress");
        Ok(seeded)
    }

    async fn load_progress(&self, user_id: &UserId, topic_id: TopicId) -> Result<Option<ProgressRecord>> {
        Ok(self
            .list_progress(user_id)
            .await?
            .into_iter()
            .find(|r| r.topic_id == topic_id))
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>> {
        let path = self.progress_path(user_id)?;
        let _guard = self.write_lock.lock().await;
        read_progress(&path, user_id).await
    }
}

/// Records of `user_id` stored at `path`. Foreign records are skipped.
async fn read_progress(path: &Path, user_id: &UserId) -> Result<Vec<ProgressRecord>> {
    let records: Vec<ProgressRecord> = read_json(path).await?.unwrap_or_default();
    let total = records.len();
    let own: Vec<ProgressRecord> = records.into_iter().filter(|r| r.user_id == *user_id).collect();
    if own.len() != total {
        warn!(path = %path.display(), user = %user_id, skipped = total - own.len(), "ignoring records of another user");
    }
    Ok(own)
}

/// Replace the record for the same topic or append.
fn put(records: &mut Vec<ProgressRecord>, record: ProgressRecord) {
    match records.iter_mut().find(|r| r.topic_id == record.topic_id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

/// Map a user id onto a file name.
///
/// Bytes of `[a-z0-9@._-]` are kept and every other byte becomes `%XX`, so
/// distinct ids never share a file, even on case-insensitive file systems. A
/// leading `.` is escaped as well.
fn file_key(user_id: &UserId) -> Result<String> {
    let raw = user_id.as_str();
    if raw.trim().is_empty() {
        return Err(StorageError::Other("empty user id".to_string()));
    }
    let mut key = String::with_capacity(raw.len());
    for (i, b) in raw.bytes().enumerate() {
        let keep = b.is_ascii_lowercase()
            || b.is_ascii_digit()
            || matches!(b, b'@' | b'_' | b'-')
            || (b == b'.' && i > 0);
        if keep {
            key.push(b as char);
        } else {
            key.push_str(&format!("%{:02X}", b));
        }
    }
    Ok(key)
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unreadable file"),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use studyplan_core::{Difficulty, Granularity, Plan, ProgressStatus, ScheduleStrategy};
    use tempfile::TempDir;

    fn empty_plan() -> Plan {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Plan {
            start_date: day,
            end_date: day,
            daily_hours: 2.0,
            granularity: Granularity::Day,
            strategy: ScheduleStrategy::BudgetPacking,
            scale_factor: 1.0,
            buckets: vec![],
            total_hours: 0.0,
            total_buckets: 0,
        }
    }

    #[tokio::test]
    async fn test_topics_round_trip_in_sequence_order() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let upload = UploadId::new();

        let topics = vec![
            Topic::new(upload, "Second", Difficulty::Easy, 1.0, 2),
            Topic::new(upload, "First", Difficulty::Hard, 3.0, 1),
        ];
        storage.save_topics(upload, &topics).await.unwrap();

        let loaded = storage.list_topics(upload).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "First");
        assert_eq!(loaded[1].name, "Second");

        assert!(storage.list_topics(UploadId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plans_listed_newest_first_per_user() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let alice = UserId::new("alice@example.com");
        let bob = UserId::new("bob@example.com");
        let upload = UploadId::new();

        let mut older = PlanRecord::new(alice.clone(), upload, empty_plan());
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = PlanRecord::new(alice.clone(), upload, empty_plan());
        let other = PlanRecord::new(bob.clone(), upload, empty_plan());

        storage.save_plan(&older).await.unwrap();
        storage.save_plan(&newer).await.unwrap();
        storage.save_plan(&other).await.unwrap();

        let plans = storage.list_plans(&alice).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, newer.id);
        assert_eq!(plans[1].id, older.id);

        let latest = storage.load_latest_plan(&alice).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);

        let loaded = storage.load_plan(other.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, bob);
        assert!(storage.load_latest_plan(&UserId::new("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_upsert_keeps_one_record_per_topic() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = UserId::new("learner@example.com");
        let topic = TopicId::new();

        let mut record = ProgressRecord::new(user.clone(), topic);
        storage.save_progress(&record).await.unwrap();

        record.status = ProgressStatus::InProgress;
        record.hours_spent = 1.5;
        storage.save_progress(&record).await.unwrap();

        let all = storage.list_progress(&user).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, ProgressStatus::InProgress);

        let loaded = storage.load_progress(&user, topic).await.unwrap().unwrap();
        assert_eq!(loaded.hours_spent, 1.5);
        assert!(storage.load_progress(&user, TopicId::new()).await.unwrap().is_none());
    }

    #[test]
    fn test_file_key_escapes_user_ids() {
        assert_eq!(file_key(&UserId::new("a.b@c.io")).unwrap(), "a.b@c.io");
        assert_eq!(file_key(&UserId::new("../etc/passwd")).unwrap(), "%2E.%2Fetc%2Fpasswd");
        assert_eq!(file_key(&UserId::new("..")).unwrap(), "%2E.");
        assert_eq!(file_key(&UserId::new("Ann")).unwrap(), "%41nn");
        assert!(file_key(&UserId::new("  ")).is_err());
        assert!(file_key(&UserId::new("")).is_err());
    }

    #[test]
    fn test_file_key_is_injective() {
        let ids = ["a b", "a_b", "a%20b", "A", "a", " a", "a ", "%41"];
        let keys: HashSet<String> = ids.iter().map(|id| file_key(&UserId::new(*id)).unwrap()).collect();
        assert_eq!(keys.len(), ids.len());
    }

    #[tokio::test]
    async fn test_similar_user_ids_keep_separate_progress() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let spaced = UserId::new("a b");
        let underscored = UserId::new("a_b");
        let topic = TopicId::new();

        let mut record = ProgressRecord::new(spaced.clone(), topic);
        record.status = ProgressStatus::Completed;
        record.hours_spent = 3.0;
        storage.save_progress(&record).await.unwrap();

        assert!(storage.list_progress(&underscored).await.unwrap().is_empty());
        assert!(storage.load_progress(&underscored, topic).await.unwrap().is_none());

        storage
            .save_progress(&ProgressRecord::new(underscored.clone(), topic))
            .await
            .unwrap();
        let kept = storage.load_progress(&spaced, topic).await.unwrap().unwrap();
        assert_eq!(kept.status, ProgressStatus::Completed);
        assert_eq!(kept.hours_spent, 3.0);
    }

    #[tokio::test]
    async fn test_foreign_records_in_a_file_are_ignored() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = UserId::new("learner@example.com");
        let stray = ProgressRecord::new(UserId::new("someone-else"), TopicId::new());
        write_json(&storage.progress_path(&user).unwrap(), &vec![stray]).await.unwrap();

        assert!(storage.list_progress(&user).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_upsert_applies_under_one_lock() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(JsonStorage::new(dir.path()).await.unwrap());
        let user = UserId::new("learner@example.com");
        let topic = TopicId::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let storage = Arc::clone(&storage);
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .upsert_progress(&user, topic, |current| {
                        let mut record = current.unwrap_or_else(|| ProgressRecord::new(user.clone(), topic));
                        record.hours_spent += 0.5;
                        Ok::<_, StorageError>(record)
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = storage.load_progress(&user, topic).await.unwrap().unwrap();
        assert_eq!(record.hours_spent, 8.0);
    }

    #[tokio::test]
    async fn test_upsert_error_leaves_record_alone() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = UserId::new("learner@example.com");
        let topic = TopicId::new();
        storage.save_progress(&ProgressRecord::new(user.clone(), topic)).await.unwrap();

        let result = storage
            .upsert_progress(&user, topic, |_| Err(StorageError::Other("rejected".to_string())))
            .await;
        assert!(result.is_err());

        let wrong_topic = storage
            .upsert_progress(&user, topic, |_| {
                Ok::<_, StorageError>(ProgressRecord::new(user.clone(), TopicId::new()))
            })
            .await;
        assert!(wrong_topic.is_err());
        assert_eq!(storage.list_progress(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_skips_existing_records() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = UserId::new("learner@example.com");
        let topics: Vec<TopicId> = (0..3).map(|_| TopicId::new()).collect();

        let mut started = ProgressRecord::new(user.clone(), topics[0]);
        started.status = ProgressStatus::InProgress;
        storage.save_progress(&started).await.unwrap();

        let seeded = storage.seed_progress(&user, &[topics[0], topics[1], topics[2], topics[1]]).await.unwrap();
        assert_eq!(seeded, 2);
        assert_eq!(storage.list_progress(&user).await.unwrap().len(), 3);
        let kept = storage.load_progress(&user, topics[0]).await.unwrap().unwrap();
        assert_eq!(kept.status, ProgressStatus::InProgress);

        assert_eq!(storage.seed_progress(&user, &topics).await.unwrap(), 0);
    }
}
