use feedesk_domain::{DepartmentId, EffectiveUser};

/// Returns whether the actor's current view covers records of `department`.
///
/// Admins, principals and holders of a global grant see every department.
/// Records without a department are only visible to those.
pub(crate) fn sees_department(actor: &EffectiveUser, department: Option<&DepartmentId>) -> bool {
    let view = actor.acting_as();
    if view.role().short_circuits_access() || view.department_grants().is_global() {
        return true;
    }

    department.is_some_and(|department| view.department_grants().covers(department))
}
