//! Positional children passed at construction time.
//!
//! Containers describe which child kinds they take with a [`ChildPolicy`].
//! [`ChildPolicy::add_children`] checks every child before adding any, so a
//! rejected list leaves the container untouched.
//!
//! ```
//! use mdkit_components::{behaviors::declarative::ChildPolicy, children};
//! use mdkit_ui::Widget;
//!
//! const ROW: ChildPolicy = ChildPolicy::new("Row", &["Label"]);
//!
//! let row = Widget::new("Row");
//! ROW.add_children(&row, children![Widget::new("Label").with_id("title")])
//!     .unwrap();
//! assert!(row.get_by_id("title").is_some());
//! assert!(ROW.add_children(&row, children![Widget::new("Slider")]).is_err());
//! ```

use mdkit_ui::Widget;

use crate::error::CompositionError;

/// Which child kinds a container accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPolicy {
    /// Kind of the container, used in errors.
    pub parent: &'static str,
    /// Accepted child kinds; empty accepts anything.
    pub accepted: &'static [&'static str],
}

impl ChildPolicy {
    /// Policy accepting exactly `accepted`.
    pub const fn new(parent: &'static str, accepted: &'static [&'static str]) -> Self {
        Self { parent, accepted }
    }

    /// Policy accepting any child.
    pub const fn any(parent: &'static str) -> Self {
        Self {
            parent,
            accepted: &[],
        }
    }

    /// Whether `child` may be added.
    pub fn check(&self, child: &Widget) -> Result<(), CompositionError> {
        if self.accepted.is_empty() || self.accepted.contains(&child.kind()) {
            return Ok(());
        }
        Err(CompositionError::UnsupportedChildType {
            parent: self.parent.to_string(),
            child: child.kind().to_string(),
            accepted: self.accepted.iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Validates every child, then appends them to `container` in order.
    /// Children with an id become retrievable through the container's id
    /// table.
    pub fn add_children<I>(
        &self,
        container: &Widget,
        children: I,
    ) -> Result<Vec<Widget>, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let children: Vec<Widget> = children.into_iter().map(Into::into).collect();
        for child in &children {
            self.check(child)?;
        }
        for child in &children {
            container.add_widget(child);
        }
        Ok(children)
    }
}

/// Looks `id` up in the subtree of `root`, its own id table first.
pub fn find_by_id(root: &Widget, id: &str) -> Option<Widget> {
    root.get_by_id(id)
        .or_else(|| root.find(&|w| w.id().as_deref() == Some(id)))
}

/// Collects widgets and widget wrappers into a `Vec<Widget>`.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        ::std::vec![$(::mdkit_ui::Widget::from($child)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: ChildPolicy = ChildPolicy::new("List", &["ListItem", "Divider"]);

    #[test]
    fn rejected_child_leaves_container_untouched() {
        let list = Widget::new("List");
        let err = LIST
            .add_children(&list, [Widget::new("ListItem"), Widget::new("Slider")])
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::UnsupportedChildType {
                parent: "List".into(),
                child: "Slider".into(),
                accepted: vec!["ListItem".into(), "Divider".into()],
            }
        );
        assert_eq!(list.child_count(), 0);
    }

    #[test]
    fn children_keep_order_and_ids() {
        let list = Widget::new("List");
        let nested = Widget::new("ListItem");
        nested.add_widget(&Widget::new("Label").with_id("deep"));
        LIST.add_children(
            &list,
            [
                Widget::new("ListItem").with_id("first"),
                Widget::new("Divider"),
                nested,
            ],
        )
        .unwrap();
        let kinds: Vec<_> = list.children().iter().map(Widget::kind).collect();
        assert_eq!(kinds, ["ListItem", "Divider", "ListItem"]);
        assert!(list.get_by_id("first").is_some());
        assert!(find_by_id(&list, "deep").is_some());
        assert!(find_by_id(&list, "missing").is_none());
    }

    #[test]
    fn open_policy_accepts_anything() {
        let any = ChildPolicy::any("Box");
        assert!(any.check(&Widget::new("Whatever")).is_ok());
    }
}
