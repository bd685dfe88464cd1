//! Hoisting embedded entity fields into their container

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::config::CollisionPolicy;
use crate::error::{CodegenError, Result};
use crate::parser::{Embedding, EntityDescriptor, FieldDescriptor, SemanticType};

/// Flatten the entities marked as tables.
///
/// Embedded fields are replaced, depth first, by the fields of the entity
/// they embed, with accessor paths prefixed by the embedding field. Each
/// entity is flattened once and reused wherever it is embedded. Entities
/// that are not tables are only read as embedding targets.
pub fn flatten(
    entities: &[EntityDescriptor],
    policy: CollisionPolicy,
) -> Result<Vec<EntityDescriptor>> {
    let mut flattener = Flattener {
        index: entities.iter().map(|e| (e.name.as_str(), e)).collect(),
        memo: HashMap::new(),
        stack: Vec::new(),
        policy,
    };
    entities
        .iter()
        .filter(|entity| entity.is_table)
        .map(|entity| {
            let fields = flattener.fields_of(&entity.name)?;
            Ok(EntityDescriptor {
                fields,
                ..entity.clone()
            })
        })
        .collect()
}

struct Flattener<'a> {
    index: HashMap<&'a str, &'a EntityDescriptor>,
    memo: HashMap<String, Vec<FieldDescriptor>>,
    stack: Vec<String>,
    policy: CollisionPolicy,
}

impl Flattener<'_> {
    fn fields_of(&mut self, name: &str) -> Result<Vec<FieldDescriptor>> {
        if let Some(done) = self.memo.get(name) {
            return Ok(done.clone());
        }
        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(name.to_string());
            return Err(CodegenError::CyclicEmbeddingError(chain.join(" -> ")));
        }
        let Some(entity) = self.index.get(name).copied() else {
            return Ok(Vec::new());
        };

        self.stack.push(name.to_string());
        let mut out: Vec<FieldDescriptor> = Vec::with_capacity(entity.fields.len());
        let mut columns: HashSet<String> = HashSet::new();
        for field in &entity.fields {
            let Some(how) = field.embedded else {
                self.push(entity, &mut out, &mut columns, field.clone())?;
                continue;
            };
            let target = match &field.semantic {
                SemanticType::Composite(inner) if self.index.contains_key(inner.as_str()) => {
                    Some(inner.clone())
                }
                _ => None,
            };
            let embedded = match (target, how) {
                (Some(target), _) => target,
                (None, Embedding::Serde) => {
                    let field = FieldDescriptor {
                        embedded: None,
                        ..field.clone()
                    };
                    self.push(entity, &mut out, &mut columns, field)?;
                    continue;
                }
                (None, Embedding::Declared) => {
                    self.stack.pop();
                    return Err(CodegenError::ExtractionError {
                        name: format!("{}.{}", entity.name, field.name),
                        location: field.location.clone(),
                        message: format!("embedded type `{}` is not a known entity", field.ty),
                    });
                }
            };
            let hoisted = match self.fields_of(&embedded) {
                Ok(fields) => fields,
                Err(err) => {
                    self.stack.pop();
                    return Err(err);
                }
            };
            for inner in hoisted {
                let accessor = format!("{}.{}", field.accessor, inner.accessor);
                self.push(entity, &mut out, &mut columns, FieldDescriptor { accessor, ..inner })?;
            }
        }
        self.stack.pop();
        self.memo.insert(name.to_string(), out.clone());
        Ok(out)
    }

    fn push(
        &self,
        entity: &EntityDescriptor,
        out: &mut Vec<FieldDescriptor>,
        columns: &mut HashSet<String>,
        field: FieldDescriptor,
    ) -> Result<()> {
        if field.skip || columns.insert(field.column.clone()) {
            out.push(field);
            return Ok(());
        }
        match self.policy {
            CollisionPolicy::FirstWins => {
                warn!(
                    "{}: column `{}` from `{}` collides with an earlier field and is dropped",
                    entity.name, field.column, field.accessor
                );
                Ok(())
            }
            CollisionPolicy::Error => Err(CodegenError::FieldCollisionError {
                entity: entity.name.clone(),
                column: field.column,
            }),
        }
    }
}
