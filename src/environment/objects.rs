use std::collections::HashMap;

use super::{ElementId, TypeId};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
	#[error("object type \"{0}\" is already defined with other elements")]
	Redefined(String),
}

/// A user-defined object type and its element names, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
	pub name:     String,
	pub elements: Vec<ElementId>,
}

/// Object types and the element names they share.
///
/// Element names are global: `p.x` resolves `x` once, whatever type `p`
/// turns out to have at run time.
#[derive(Debug, Default)]
pub struct ObjectTable {
	types:         Vec<ObjectType>,
	type_index:    HashMap<String, TypeId>,
	elements:      Vec<String>,
	element_index: HashMap<String, ElementId>,
}

impl ObjectTable {
	/// Define a type. Repeating an identical definition is allowed.
	pub fn define_object_type(&mut self, name: &str, elements: Vec<ElementId>) -> Result<TypeId, ObjectError> {
		if let Some(&id) = self.type_index.get(name) {
			if self.types[id.index()].elements == elements {
				return Ok(id);
			}
			return Err(ObjectError::Redefined(name.to_string()));
		}
		let id = TypeId::from_index(self.types.len());
		self.types.push(ObjectType { name: name.to_string(), elements });
		self.type_index.insert(name.to_string(), id);
		Ok(id)
	}

	pub fn lookup_object_type(&self, name: &str) -> Option<TypeId> { self.type_index.get(name).copied() }

	pub fn object_type(&self, id: TypeId) -> Option<&ObjectType> { self.types.get(id.index()) }

	pub fn types(&self) -> impl Iterator<Item = &ObjectType> { self.types.iter() }

	pub fn intern_element_name(&mut self, name: &str) -> ElementId {
		if let Some(&id) = self.element_index.get(name) {
			return id;
		}
		let id = ElementId::from_index(self.elements.len());
		self.elements.push(name.to_string());
		self.element_index.insert(name.to_string(), id);
		id
	}

	pub fn lookup_element(&self, name: &str) -> Option<ElementId> { self.element_index.get(name).copied() }

	pub fn element_name(&self, id: ElementId) -> Option<&str> { self.elements.get(id.index()).map(String::as_str) }
}
