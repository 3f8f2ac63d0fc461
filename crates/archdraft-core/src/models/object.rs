use super::diagram::{Diagram, DiagramKind};
use super::text_or_empty;
use crate::controller::{self, int, opt_text, Entity, NewEntity};
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::Serialize;
use std::marker::PhantomData;

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A class, participant or entity that can appear on diagrams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Object {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entity for Object {
    const NAME: &'static str = "object";
    const TABLE: &'static str = "objects";
    const COLUMNS: &'static [&'static str] = &["name", "type"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
            kind: text_or_empty(row, "type")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Object {
    pub fn attributes(&self, conn: &Connection) -> Result<Vec<Attribute>> {
        controller::list(conn, &[("object_id", int(self.id))])
    }

    pub fn methods(&self, conn: &Connection) -> Result<Vec<Method>> {
        controller::list(conn, &[("object_id", int(self.id))])
    }

    /// Place this object on a diagram of kind `K`.
    pub fn link_to<K: DiagramKind>(&self, conn: &Connection, diagram_id: i64) -> Result<ObjectLink<K>> {
        controller::add(
            conn,
            &NewObjectLink::<K> {
                diagram_id,
                object_id: self.id,
                kind: PhantomData,
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: Option<String>,
    pub kind: Option<String>,
}

impl NewEntity for NewObject {
    type Entity = Object;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", opt_text(self.name.clone())),
            ("type", opt_text(self.kind.clone())),
        ]
    }
}

// ---------------------------------------------------------------------------
// ObjectLink
// ---------------------------------------------------------------------------

/// Row of `sequence_objects`, `class_objects` or `entity_relationship_objects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct ObjectLink<K: DiagramKind> {
    pub id: i64,
    pub diagram_id: i64,
    pub object_id: i64,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K: DiagramKind> Entity for ObjectLink<K> {
    const NAME: &'static str = "object link";
    const TABLE: &'static str = K::LINK_TABLE;
    const COLUMNS: &'static [&'static str] = &[K::LINK_COLUMN, "object_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            diagram_id: row.get(K::LINK_COLUMN)?,
            object_id: row.get("object_id")?,
            kind: PhantomData,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

struct NewObjectLink<K: DiagramKind> {
    diagram_id: i64,
    object_id: i64,
    kind: PhantomData<K>,
}

impl<K: DiagramKind> NewEntity for NewObjectLink<K> {
    type Entity = ObjectLink<K>;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![(K::LINK_COLUMN, int(self.diagram_id)), ("object_id", int(self.object_id))]
    }
}

impl<K: DiagramKind> Diagram<K> {
    /// Objects placed on this diagram, in link order.
    pub fn objects(&self, conn: &Connection) -> Result<Vec<Object>> {
        let sql = format!(
            "SELECT o.id, o.name, o.type FROM objects o \
             JOIN {link} l ON l.object_id = o.id \
             WHERE l.{col} = ?1 ORDER BY l.id",
            link = K::LINK_TABLE,
            col = K::LINK_COLUMN,
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([self.id], |r| Object::from_row(r))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Attribute / Method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
    pub data_type: String,
    pub visibility: String,
    pub object_id: i64,
}

impl Entity for Attribute {
    const NAME: &'static str = "attribute";
    const TABLE: &'static str = "attributes";
    const COLUMNS: &'static [&'static str] = &["name", "data_type", "visibility", "object_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
            data_type: text_or_empty(row, "data_type")?,
            visibility: text_or_empty(row, "visibility")?,
            object_id: row.get("object_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewAttribute {
    pub name: String,
    pub data_type: Option<String>,
    pub visibility: Option<String>,
    pub object_id: i64,
}

impl NewEntity for NewAttribute {
    type Entity = Attribute;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(self.name.clone())),
            ("data_type", opt_text(self.data_type.clone())),
            ("visibility", opt_text(self.visibility.clone())),
            ("object_id", int(self.object_id)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub id: i64,
    pub name: String,
    pub return_type: String,
    pub visibility: String,
    pub parameters: String,
    pub object_id: i64,
}

impl Entity for Method {
    const NAME: &'static str = "method";
    const TABLE: &'static str = "methods";
    const COLUMNS: &'static [&'static str] =
        &["name", "return_type", "visibility", "parameters", "object_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
            return_type: text_or_empty(row, "return_type")?,
            visibility: text_or_empty(row, "visibility")?,
            parameters: text_or_empty(row, "parameters")?,
            object_id: row.get("object_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewMethod {
    pub name: String,
    pub return_type: Option<String>,
    pub visibility: Option<String>,
    pub parameters: Option<String>,
    pub object_id: i64,
}

impl NewEntity for NewMethod {
    type Entity = Method;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(self.name.clone())),
            ("return_type", opt_text(self.return_type.clone())),
            ("visibility", opt_text(self.visibility.clone())),
            ("parameters", opt_text(self.parameters.clone())),
            ("object_id", int(self.object_id)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{add, delete, list};
    use crate::models::account::NewUserAccount;
    use crate::models::diagram::{Class, ClassDiagram, NewDiagram, Sequence};
    use crate::models::project::NewProject;
    use crate::models::usecase::{NewUsecase, UsecaseFields};
    use crate::schema;

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        schema::apply(&conn).unwrap();
        let user = add(
            &conn,
            &NewUserAccount {
                account: "u".into(),
                password: "p".into(),
            },
        )
        .unwrap();
        let project = add(&conn, &NewProject::named(user.id, "p")).unwrap();
        let uc = add(
            &conn,
            &NewUsecase {
                project_id: project.id,
                fields: UsecaseFields::default(),
            },
        )
        .unwrap();
        (conn, uc.id)
    }

    fn object(conn: &Connection, name: &str) -> Object {
        add(
            conn,
            &NewObject {
                name: Some(name.into()),
                kind: Some("class".into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn objects_on_diagram_follow_link_order() {
        let (conn, uc) = setup();
        let diagram = add(&conn, &NewDiagram::<Class>::new(uc)).unwrap();
        let order = object(&conn, "Order");
        let customer = object(&conn, "Customer");
        customer.link_to::<Class>(&conn, diagram.id).unwrap();
        order.link_to::<Class>(&conn, diagram.id).unwrap();

        let names: Vec<_> = diagram
            .objects(&conn)
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, ["Customer", "Order"]);
    }

    #[test]
    fn deleting_object_removes_members_and_links() {
        let (conn, uc) = setup();
        let diagram = add(&conn, &NewDiagram::<Sequence>::new(uc)).unwrap();
        let order = object(&conn, "Order");
        order.link_to::<Sequence>(&conn, diagram.id).unwrap();
        add(
            &conn,
            &NewAttribute {
                name: "total".into(),
                data_type: Some("decimal".into()),
                visibility: Some("private".into()),
                object_id: order.id,
            },
        )
        .unwrap();
        add(
            &conn,
            &NewMethod {
                name: "checkout".into(),
                return_type: Some("bool".into()),
                visibility: None,
                parameters: Some("card: Card".into()),
                object_id: order.id,
            },
        )
        .unwrap();
        assert_eq!(order.attributes(&conn).unwrap().len(), 1);
        assert_eq!(order.methods(&conn).unwrap()[0].visibility, "");

        delete::<Object>(&conn, order.id).unwrap();
        assert!(list::<Attribute>(&conn, &[]).unwrap().is_empty());
        assert!(list::<Method>(&conn, &[]).unwrap().is_empty());
        assert!(list::<ObjectLink<Sequence>>(&conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn deleting_diagram_removes_its_links_only() {
        let (conn, uc) = setup();
        let diagram = add(&conn, &NewDiagram::<Class>::new(uc)).unwrap();
        let order = object(&conn, "Order");
        order.link_to::<Class>(&conn, diagram.id).unwrap();

        delete::<ClassDiagram>(&conn, diagram.id).unwrap();
        assert!(list::<ObjectLink<Class>>(&conn, &[]).unwrap().is_empty());
        assert_eq!(list::<Object>(&conn, &[]).unwrap().len(), 1);
    }
}
