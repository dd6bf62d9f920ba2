//! Built-in shape nodes.

use super::{Component, ComponentProps, ComponentRef, ComponentRegistry};

/// Create a 200x100 rectangle.
pub fn rectangle(registry: &ComponentRegistry, id: Option<&str>) -> ComponentRef {
    let mut props = ComponentProps::new("Rectangle").size(200, 100);
    props.id = id.map(str::to_string);
    Component::create(registry, props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Registry;

    #[test]
    fn test_rectangle_defaults() {
        let registry: ComponentRegistry = Registry::new("component");
        let first = rectangle(&registry, None);
        let second = rectangle(&registry, None);

        assert_eq!(first.name(), "Rectangle");
        assert_eq!(second.name(), "Rectangle-1");
        assert_eq!((first.width(), first.height()), (200, 100));
        assert_eq!(first.type_name(), "Rectangle");
        assert!(!first.is_layout());
    }
}
