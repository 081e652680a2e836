//! The company → department → position picker behind `company_structure` fields.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{FieldValueError, StructureError};
use crate::models::{Company, OrgDepartment, Position};
use crate::reference::StructureData;

/// The value a `company_structure` field stores, JSON-encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyStructureValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<i64>,
}

impl CompanyStructureValue {
    pub fn is_empty(&self) -> bool {
        self.company_id.is_none() && self.department_id.is_none() && self.position_id.is_none()
    }

    pub fn encode(&self) -> String {
        // A struct of optional integers always serializes
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Reads the wire value, which must be a JSON object.
    pub fn decode(raw: &str) -> Result<Self, FieldValueError> {
        let invalid = |e: serde_json::Error| FieldValueError::InvalidCompanyStructure(e.to_string());
        let value: serde_json::Value = serde_json::from_str(raw).map_err(invalid)?;
        if !value.is_object() {
            return Err(FieldValueError::InvalidCompanyStructure(format!(
                "expected an object, got {raw}"
            )));
        }
        serde_json::from_value(value).map_err(invalid)
    }
}

/// A department with its depth in the company's tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentOption<'a> {
    pub department: &'a OrgDepartment,
    pub level: usize,
}

/// Flattens departments depth-first from the roots (no `parent_id`),
/// recording each one's depth. Departments unreachable from a root are left out.
pub fn build_hierarchy(departments: &[&OrgDepartment]) -> Vec<(usize, i64)> {
    let mut children: HashMap<Option<i64>, Vec<&OrgDepartment>> = HashMap::new();
    for dept in departments {
        children.entry(dept.parent_id).or_default().push(*dept);
    }

    let mut result = Vec::new();
    let mut visited = HashSet::new();
    // Children go on the stack reversed so siblings come out in input order
    let mut stack: Vec<(&OrgDepartment, usize)> = children
        .get(&None)
        .map(|roots| roots.iter().rev().map(|d| (*d, 0)).collect())
        .unwrap_or_default();
    while let Some((dept, level)) = stack.pop() {
        if !visited.insert(dept.id) {
            continue;
        }
        result.push((level, dept.id));
        if let Some(kids) = children.get(&Some(dept.id)) {
            stack.extend(kids.iter().rev().map(|k| (*k, level + 1)));
        }
    }
    result
}

/// Cascading selection state over a loaded [`StructureData`].
///
/// Choosing a company clears the department and position, choosing a
/// department clears the position. Positions are limited to those linked to
/// the selected department.
#[derive(Debug, Clone)]
pub struct CompanyStructureSelector<'a> {
    data: &'a StructureData,
    value: CompanyStructureValue,
}

impl<'a> CompanyStructureSelector<'a> {
    pub fn new(data: &'a StructureData) -> Self {
        Self {
            data,
            value: CompanyStructureValue::default(),
        }
    }

    /// Restores the picker from a stored value without re-validating it.
    pub fn from_value(data: &'a StructureData, value: CompanyStructureValue) -> Self {
        Self { data, value }
    }

    pub fn value(&self) -> CompanyStructureValue {
        self.value
    }

    pub fn companies(&self) -> &'a [Company] {
        &self.data.companies
    }

    /// Departments of the selected company, in tree order.
    pub fn departments(&self) -> Vec<DepartmentOption<'a>> {
        let Some(company_id) = self.value.company_id else {
            return Vec::new();
        };
        let in_company: Vec<&OrgDepartment> = self
            .data
            .departments
            .iter()
            .filter(|d| d.company_id == Some(company_id))
            .collect();
        let by_id: HashMap<i64, &OrgDepartment> = in_company.iter().map(|d| (d.id, *d)).collect();

        build_hierarchy(&in_company)
            .into_iter()
            .filter_map(|(level, id)| {
                by_id
                    .get(&id)
                    .map(|department| DepartmentOption { department, level })
            })
            .collect()
    }

    /// Positions linked to the selected department.
    pub fn positions(&self) -> Vec<&'a Position> {
        let Some(department_id) = self.value.department_id else {
            return Vec::new();
        };
        let linked: HashSet<i64> = self
            .data
            .department_positions
            .iter()
            .filter(|link| link.department_id == department_id)
            .map(|link| link.position_id)
            .collect();
        self.data
            .positions
            .iter()
            .filter(|p| linked.contains(&p.id))
            .collect()
    }

    /// Ids from the root department down to the selected one.
    pub fn department_path(&self) -> Vec<i64> {
        let Some(mut current) = self.value.department_id else {
            return Vec::new();
        };
        let parents: HashMap<i64, Option<i64>> = self
            .data
            .departments
            .iter()
            .map(|d| (d.id, d.parent_id))
            .collect();

        let mut path = vec![current];
        let mut seen = HashSet::from([current]);
        while let Some(Some(parent)) = parents.get(&current) {
            if !seen.insert(*parent) {
                break;
            }
            path.push(*parent);
            current = *parent;
        }
        path.reverse();
        path
    }

    pub fn select_company(&mut self, company_id: i64) -> Result<(), StructureError> {
        if !self.data.companies.iter().any(|c| c.id == company_id) {
            return Err(StructureError::UnknownCompany(company_id));
        }
        self.value = CompanyStructureValue {
            company_id: Some(company_id),
            ..Default::default()
        };
        Ok(())
    }

    pub fn select_department(&mut self, department_id: i64) -> Result<(), StructureError> {
        if self.value.company_id.is_none() {
            return Err(StructureError::NoCompany);
        }
        if !self
            .departments()
            .iter()
            .any(|option| option.department.id == department_id)
        {
            return Err(StructureError::DepartmentNotInCompany(department_id));
        }
        self.value.department_id = Some(department_id);
        self.value.position_id = None;
        Ok(())
    }

    pub fn select_position(&mut self, position_id: i64) -> Result<(), StructureError> {
        if self.value.department_id.is_none() {
            return Err(StructureError::NoDepartment);
        }
        if !self.positions().iter().any(|p| p.id == position_id) {
            return Err(StructureError::PositionNotInDepartment(position_id));
        }
        self.value.position_id = Some(position_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DepartmentPosition;

    fn dept(id: i64, name: &str, parent_id: Option<i64>, company_id: i64) -> OrgDepartment {
        OrgDepartment {
            id,
            name: name.to_owned(),
            parent_id,
            company_id: Some(company_id),
        }
    }

    fn structure() -> StructureData {
        StructureData {
            companies: vec![
                Company { id: 1, name: "Альфа".to_owned() },
                Company { id: 2, name: "Бета".to_owned() },
            ],
            departments: vec![
                dept(10, "ИТ", None, 1),
                dept(11, "Инфраструктура", Some(10), 1),
                dept(12, "Сети", Some(11), 1),
                dept(13, "Бухгалтерия", None, 1),
                dept(14, "Разработка", Some(10), 1),
                dept(20, "Склад", None, 2),
            ],
            positions: vec![
                Position { id: 100, name: "Инженер".to_owned() },
                Position { id: 101, name: "Бухгалтер".to_owned() },
                Position { id: 102, name: "Кладовщик".to_owned() },
            ],
            department_positions: vec![
                DepartmentPosition { department_id: 12, position_id: 100 },
                DepartmentPosition { department_id: 13, position_id: 101 },
                DepartmentPosition { department_id: 20, position_id: 102 },
            ],
        }
    }

    #[test]
    fn departments_are_listed_depth_first_with_levels() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        assert!(selector.departments().is_empty());

        selector.select_company(1).unwrap();
        let listed: Vec<(i64, usize)> = selector
            .departments()
            .iter()
            .map(|o| (o.department.id, o.level))
            .collect();
        assert_eq!(listed, vec![(10, 0), (11, 1), (12, 2), (14, 1), (13, 0)]);
    }

    #[test]
    fn hierarchy_survives_parent_cycles() {
        let a = OrgDepartment { id: 1, name: "a".into(), parent_id: None, company_id: None };
        let b = OrgDepartment { id: 2, name: "b".into(), parent_id: Some(3), company_id: None };
        let c = OrgDepartment { id: 3, name: "c".into(), parent_id: Some(2), company_id: None };
        assert_eq!(build_hierarchy(&[&a, &b, &c]), vec![(0, 1)]);
    }

    #[test]
    fn positions_are_limited_to_the_selected_department() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        selector.select_company(1).unwrap();
        selector.select_department(12).unwrap();

        let positions: Vec<i64> = selector.positions().iter().map(|p| p.id).collect();
        assert_eq!(positions, vec![100]);
        assert_eq!(
            selector.select_position(101),
            Err(StructureError::PositionNotInDepartment(101))
        );
    }

    #[test]
    fn choosing_upstream_clears_downstream() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        selector.select_company(1).unwrap();
        selector.select_department(13).unwrap();
        selector.select_position(101).unwrap();

        selector.select_department(12).unwrap();
        assert_eq!(selector.value().position_id, None);

        selector.select_company(2).unwrap();
        assert_eq!(
            selector.value(),
            CompanyStructureValue { company_id: Some(2), ..Default::default() }
        );
    }

    #[test]
    fn department_must_belong_to_company() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        assert_eq!(selector.select_department(10), Err(StructureError::NoCompany));
        selector.select_company(2).unwrap();
        assert_eq!(
            selector.select_department(10),
            Err(StructureError::DepartmentNotInCompany(10))
        );
        assert_eq!(selector.select_company(9), Err(StructureError::UnknownCompany(9)));
    }

    #[test]
    fn department_path_runs_from_root() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        selector.select_company(1).unwrap();
        selector.select_department(12).unwrap();
        assert_eq!(selector.department_path(), vec![10, 11, 12]);
    }

    #[test]
    fn serialized_value_restores_the_same_selection() {
        let data = structure();
        let mut selector = CompanyStructureSelector::new(&data);
        selector.select_company(1).unwrap();
        selector.select_department(12).unwrap();
        selector.select_position(100).unwrap();

        let encoded = selector.value().encode();
        let restored =
            CompanyStructureSelector::from_value(&data, CompanyStructureValue::decode(&encoded).unwrap());

        assert_eq!(restored.value(), selector.value());
        assert_eq!(restored.department_path(), selector.department_path());
        assert_eq!(restored.value().position_id, Some(100));
    }

    #[test]
    fn partial_values_omit_missing_keys() {
        let value = CompanyStructureValue { company_id: Some(1), ..Default::default() };
        assert_eq!(value.encode(), r#"{"company_id":1}"#);
        assert!(CompanyStructureValue::decode("{}").unwrap().is_empty());
        assert!(CompanyStructureValue::decode("[1,2]").is_err());
    }

    #[test]
    fn only_objects_decode() {
        for raw in ["[1,2]", "[]", "1", "\"company\"", "null", "{\"company_id\": \"x\"}"] {
            assert!(
                matches!(
                    CompanyStructureValue::decode(raw),
                    Err(FieldValueError::InvalidCompanyStructure(_))
                ),
                "{raw} should not decode"
            );
        }
        assert_eq!(
            CompanyStructureValue::decode(r#"{"company_id": 1, "position_id": 100}"#).unwrap(),
            CompanyStructureValue {
                company_id: Some(1),
                department_id: None,
                position_id: Some(100),
            }
        );
    }
}
