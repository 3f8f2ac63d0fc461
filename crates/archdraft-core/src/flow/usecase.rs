use crate::controller::{self, Entity};
use crate::db::Db;
use crate::error::{ArchdraftError, Result};
use crate::models::account::UserAccount;
use crate::models::event::{Event, EventInput, EventList, NewEvent, NewEventList};
use crate::models::project::Project;
use crate::models::usecase::{Actor, NewUsecase, Usecase, UsecaseActor, UsecaseFields};
use rusqlite::Connection;
use serde::Serialize;

/// An event list together with its events, in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventListDetail {
    #[serde(flatten)]
    pub list: EventList,
    pub events: Vec<Event>,
}

/// Use cases, actors and event lists under the current user's projects.
/// Anything outside the user's projects reads as not found.
#[derive(Debug, Clone)]
pub struct UsecaseFlow {
    db: Db,
}

impl UsecaseFlow {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    // -----------------------------------------------------------------------
    // Use cases
    // -----------------------------------------------------------------------

    pub async fn create_usecase(
        &self,
        account: &str,
        project_id: i64,
        fields: UsecaseFields,
    ) -> Result<Usecase> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                let project = owned_project(conn, &account, project_id)?;
                check_name(&fields, true)?;
                let uc = controller::add(
                    conn,
                    &NewUsecase {
                        project_id: project.id,
                        fields,
                    },
                )?;
                tracing::info!(use_case_id = uc.id, project_id, "use case created");
                Ok(uc)
            })
            .await
    }

    pub async fn list_usecases(&self, account: &str, project_id: i64) -> Result<Vec<Usecase>> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_project(conn, &account, project_id)?;
                Usecase::list_for_project(conn, project_id)
            })
            .await
    }

    pub async fn get_usecase(&self, account: &str, use_case_id: i64) -> Result<Usecase> {
        let account = account.to_string();
        self.db
            .run(move |conn| owned_usecase(conn, &account, use_case_id))
            .await
    }

    /// Change the given fields; `None` fields keep their stored value.
    pub async fn update_usecase(
        &self,
        account: &str,
        use_case_id: i64,
        fields: UsecaseFields,
    ) -> Result<Usecase> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                check_name(&fields, false)?;
                controller::update::<Usecase>(conn, use_case_id, &fields.changes())?
                    .ok_or_else(|| ArchdraftError::not_found(Usecase::NAME, use_case_id))
            })
            .await
    }

    pub async fn delete_usecase(&self, account: &str, use_case_id: i64) -> Result<()> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                controller::delete::<Usecase>(conn, use_case_id)?;
                Ok(())
            })
            .await
    }

    // -----------------------------------------------------------------------
    // Actors
    // -----------------------------------------------------------------------

    /// Link the actor called `name` (created if needed) to a use case.
    pub async fn attach_actor(&self, account: &str, use_case_id: i64, name: &str) -> Result<Actor> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ArchdraftError::InvalidInput(
                "actor name must not be empty".to_string(),
            ));
        }
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                let tx = conn.transaction()?;
                let actor = Actor::find_or_create(&tx, &name)?;
                UsecaseActor::link(&tx, use_case_id, actor.id)?;
                tx.commit()?;
                Ok(actor)
            })
            .await
    }

    pub async fn list_actors(&self, account: &str, use_case_id: i64) -> Result<Vec<Actor>> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                UsecaseActor::actors(conn, use_case_id)
            })
            .await
    }

    /// Unlink an actor. The actor row itself is kept for other use cases.
    pub async fn detach_actor(&self, account: &str, use_case_id: i64, actor_id: i64) -> Result<bool> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                UsecaseActor::unlink(conn, use_case_id, actor_id)
            })
            .await
    }

    // -----------------------------------------------------------------------
    // Event lists
    // -----------------------------------------------------------------------

    /// Create an event list with its events. Events without a sequence
    /// number are numbered by position, starting at 1.
    pub async fn create_event_list(
        &self,
        account: &str,
        use_case_id: i64,
        kind: &str,
        events: Vec<EventInput>,
    ) -> Result<EventListDetail> {
        let account = account.to_string();
        let kind = kind.trim().to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                let tx = conn.transaction()?;
                let list = controller::add(&tx, &NewEventList { kind, use_case_id })?;
                for (i, input) in events.into_iter().enumerate() {
                    controller::add(
                        &tx,
                        &NewEvent {
                            sequence_no: input.sequence_no.unwrap_or(i as i64 + 1),
                            kind: input.kind,
                            description: input.description,
                            event_list_id: list.id,
                        },
                    )?;
                }
                let events = list.events(&tx)?;
                tx.commit()?;
                Ok(EventListDetail { list, events })
            })
            .await
    }

    pub async fn list_event_lists(&self, account: &str, use_case_id: i64) -> Result<Vec<EventListDetail>> {
        let account = account.to_string();
        self.db
            .run(move |conn| {
                owned_usecase(conn, &account, use_case_id)?;
                EventList::list_for_use_case(conn, use_case_id)?
                    .into_iter()
                    .map(|list| {
                        let events = list.events(conn)?;
                        Ok(EventListDetail { list, events })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

fn user_id(conn: &Connection, account: &str) -> Result<i64> {
    UserAccount::find(conn, account)?
        .map(|u| u.id)
        .ok_or_else(|| ArchdraftError::not_found(UserAccount::NAME, account))
}

fn owned_project(conn: &Connection, account: &str, project_id: i64) -> Result<Project> {
    let user_id = user_id(conn, account)?;
    controller::get::<Project>(conn, project_id)?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| ArchdraftError::not_found(Project::NAME, project_id))
}

fn owned_usecase(conn: &Connection, account: &str, use_case_id: i64) -> Result<Usecase> {
    let uc = controller::get::<Usecase>(conn, use_case_id)?
        .ok_or_else(|| ArchdraftError::not_found(Usecase::NAME, use_case_id))?;
    owned_project(conn, account, uc.project_id)
        .map_err(|_| ArchdraftError::not_found(Usecase::NAME, use_case_id))?;
    Ok(uc)
}

/// A given name must not be blank; `required` also rejects a missing one.
fn check_name(fields: &UsecaseFields, required: bool) -> Result<()> {
    let blank = match fields.name.as_deref() {
        Some(name) => name.trim().is_empty(),
        None => required,
    };
    if blank {
        return Err(ArchdraftError::InvalidInput(
            "use case name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::login::LoginFlow;
    use crate::models::project::{NewProject, ProjectFields};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        db: Db,
        flow: UsecaseFlow,
        project_id: i64,
    }

    async fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("t.db")).unwrap();
        let login = LoginFlow::new(db.clone());
        let alice = login.register("alice", "pw").await.unwrap();
        login.register("bob", "pw").await.unwrap();
        let alice_id = alice.account().unwrap().id;
        let project_id = db
            .run(move |conn| {
                Ok(controller::add(
                    conn,
                    &NewProject {
                        user_id: alice_id,
                        fields: ProjectFields {
                            name: "Kiosk".into(),
                            ..Default::default()
                        },
                    },
                )?
                .id)
            })
            .await
            .unwrap();
        Harness {
            _dir: dir,
            flow: UsecaseFlow::new(db.clone()),
            db,
            project_id,
        }
    }

    fn named(name: &str) -> UsecaseFields {
        UsecaseFields {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_list_update_delete() {
        let h = harness().await;
        let uc = h
            .flow
            .create_usecase("alice", h.project_id, named("Place order"))
            .await
            .unwrap();
        assert_eq!(uc.name, "Place order");
        assert_eq!(uc.description, "");

        let updated = h
            .flow
            .update_usecase(
                "alice",
                uc.id,
                UsecaseFields {
                    description: Some("customer orders food".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Place order");
        assert_eq!(updated.description, "customer orders food");

        assert_eq!(h.flow.list_usecases("alice", h.project_id).await.unwrap().len(), 1);
        h.flow.delete_usecase("alice", uc.id).await.unwrap();
        assert!(h.flow.list_usecases("alice", h.project_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_see_not_found() {
        let h = harness().await;
        let uc = h
            .flow
            .create_usecase("alice", h.project_id, named("Place order"))
            .await
            .unwrap();

        let err = h.flow.get_usecase("bob", uc.id).await.unwrap_err();
        assert!(matches!(err, ArchdraftError::NotFound { .. }));
        let err = h
            .flow
            .create_usecase("bob", h.project_id, named("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchdraftError::NotFound { .. }));
    }

    #[tokio::test]
    async fn blank_use_case_name_is_invalid() {
        let h = harness().await;
        let err = h
            .flow
            .create_usecase("alice", h.project_id, UsecaseFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchdraftError::InvalidInput(_)));

        let uc = h.flow.create_usecase("alice", h.project_id, named("A")).await.unwrap();
        let err = h
            .flow
            .update_usecase("alice", uc.id, named("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchdraftError::InvalidInput(_)));
        let kept = h.flow.get_usecase("alice", uc.id).await.unwrap();
        assert_eq!(kept.name, "A");
    }

    #[tokio::test]
    async fn actors_are_shared_and_detach_keeps_the_actor() {
        let h = harness().await;
        let a = h.flow.create_usecase("alice", h.project_id, named("A")).await.unwrap();
        let b = h.flow.create_usecase("alice", h.project_id, named("B")).await.unwrap();

        let cashier = h.flow.attach_actor("alice", a.id, "Cashier").await.unwrap();
        let again = h.flow.attach_actor("alice", b.id, " Cashier ").await.unwrap();
        assert_eq!(cashier.id, again.id);
        // attaching twice is a no-op
        h.flow.attach_actor("alice", a.id, "Cashier").await.unwrap();
        assert_eq!(h.flow.list_actors("alice", a.id).await.unwrap().len(), 1);

        assert!(h.flow.detach_actor("alice", a.id, cashier.id).await.unwrap());
        assert!(!h.flow.detach_actor("alice", a.id, cashier.id).await.unwrap());
        assert!(h.flow.list_actors("alice", a.id).await.unwrap().is_empty());
        assert_eq!(h.flow.list_actors("alice", b.id).await.unwrap(), vec![cashier]);
    }

    #[tokio::test]
    async fn event_lists_keep_sequence_order() {
        let h = harness().await;
        let uc = h.flow.create_usecase("alice", h.project_id, named("A")).await.unwrap();
        let events = vec![
            EventInput {
                sequence_no: Some(2),
                kind: Some("system".into()),
                description: Some("confirm".into()),
            },
            EventInput {
                sequence_no: Some(1),
                kind: Some("actor".into()),
                description: Some("submit".into()),
            },
        ];
        let created = h
            .flow
            .create_event_list("alice", uc.id, "normal", events)
            .await
            .unwrap();
        let order: Vec<_> = created.events.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["submit", "confirm"]);

        let unnumbered = vec![EventInput::default(), EventInput::default()];
        let second = h
            .flow
            .create_event_list("alice", uc.id, "exception", unnumbered)
            .await
            .unwrap();
        let seq: Vec<_> = second.events.iter().map(|e| e.sequence_no).collect();
        assert_eq!(seq, [1, 2]);

        let lists = h.flow.list_event_lists("alice", uc.id).await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].list.kind, "normal");
    }

    #[tokio::test]
    async fn deleting_project_cascades_through_use_case_tree() {
        let h = harness().await;
        let uc = h.flow.create_usecase("alice", h.project_id, named("A")).await.unwrap();
        h.flow.attach_actor("alice", uc.id, "Cashier").await.unwrap();
        h.flow
            .create_event_list("alice", uc.id, "normal", vec![EventInput::default()])
            .await
            .unwrap();

        let project_id = h.project_id;
        let counts = h
            .db
            .run(move |conn| {
                controller::delete::<Project>(conn, project_id)?;
                let count = |table: &str| -> Result<i64> {
                    Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
                };
                Ok([
                    count("use_cases")?,
                    count("usecase_actors")?,
                    count("event_lists")?,
                    count("events")?,
                    count("actors")?,
                ])
            })
            .await
            .unwrap();
        assert_eq!(counts, [0, 0, 0, 0, 1]);
    }
}
