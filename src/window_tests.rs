//! Window Integration Tests
//!
//! End-to-end behavior of `customElements` as seen by page code: the facade,
//! the patched tree port, microtask delivery and install modes.

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::FutureExt;

    use crate::config::RegistryConfig;
    use crate::definition::{DefineOptions, ElementConstructor};
    use crate::dom::NodeId;
    use crate::element::{ConstructorKind, CustomElement, ElementContext};
    use crate::error::{
        CallbackError, ConstructionError, DuplicateError, ElementError, Hook, RegistryError,
    };
    use crate::install::InstallMode;
    use crate::patch::TreeMutationPort;
    use crate::query::LocalNameQuery;
    use crate::window::Window;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    #[derive(Debug, Default)]
    struct Foo {
        connected: usize,
        disconnected: usize,
    }

    impl CustomElement for Foo {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Foo::default())
        }

        fn connected_callback(&mut self, _cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
            self.connected += 1;
            Ok(())
        }

        fn disconnected_callback(
            &mut self,
            _cx: &mut ElementContext<'_>,
        ) -> Result<(), ElementError> {
            self.disconnected += 1;
            Ok(())
        }
    }

    struct Bar;

    impl CustomElement for Bar {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Bar)
        }
    }

    struct Legacy;

    impl CustomElement for Legacy {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Legacy)
        }

        fn constructor_kind() -> ConstructorKind {
            ConstructorKind::Transpiled
        }
    }

    struct Grumpy;

    impl CustomElement for Grumpy {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Grumpy)
        }

        fn connected_callback(&mut self, _cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
            Err(ElementError::new("not today"))
        }
    }

    /// Renders a child element when connected.
    #[derive(Debug, Default)]
    struct Card {
        rendered: bool,
    }

    impl CustomElement for Card {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Card::default())
        }

        fn connected_callback(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
            if self.rendered {
                return Ok(());
            }
            self.rendered = true;
            let node = cx.node();
            let mut tree = cx.tree();
            let badge = tree.create_element("x-foo");
            tree.append_child(node, badge)
                .map_err(|e| ElementError::new(e.to_string()))?;
            Ok(())
        }
    }

    /// Records what the element saw from inside its connected hook.
    #[derive(Debug, Default)]
    struct Witness {
        seen_connected: Option<bool>,
    }

    impl CustomElement for Witness {
        fn construct(_cx: &mut ElementContext<'_>) -> Result<Self, ElementError> {
            Ok(Witness::default())
        }

        fn connected_callback(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
            self.seen_connected = Some(cx.is_connected());
            Ok(())
        }
    }

    fn window() -> Window {
        init_tracing();
        Window::new(RegistryConfig::default())
    }

    fn foo(window: &Window, node: NodeId) -> &Foo {
        window.element::<Foo>(node).unwrap()
    }

    fn find(window: &Window, root: NodeId, name: &str) -> Vec<NodeId> {
        window.dom().query_all(root, &LocalNameQuery::single(name))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FACADE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_duplicate_name_keeps_first_definition() {
        let mut window = window();
        window.define::<Foo>("x-foo").unwrap();
        let err = window.define::<Bar>("x-foo").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate(DuplicateError::Name {
                name: "x-foo".to_string()
            })
        );
        assert_eq!(window.get("x-foo"), Some(ElementConstructor::of::<Foo>()));
        assert_eq!(window.get("x-bar"), None);
    }

    #[test]
    fn test_invalid_names_rejected_everywhere() {
        let mut window = window();
        for name in ["foo", "X-foo", "-x", "font-face", "annotation-xml"] {
            assert!(matches!(
                window.define::<Foo>(name),
                Err(RegistryError::Name(_))
            ));
            assert!(window.when_defined(name).is_err());
        }
        assert!(window.get("foo").is_none());
    }

    #[test]
    fn test_extends_is_unsupported() {
        let mut window = window();
        let err = window
            .define_with(
                "x-fancy-button",
                ElementConstructor::of::<Foo>(),
                DefineOptions {
                    extends: Some("button".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedExtension(_)));
        assert!(window.get("x-fancy-button").is_none());
    }

    #[test]
    fn test_when_defined_resolves_on_define() {
        let mut window = window();
        let mut early = window.when_defined("x-later").unwrap();
        let second = window.when_defined("x-later").unwrap();
        assert!((&mut early).now_or_never().is_none());

        window.define::<Foo>("x-later").unwrap();
        assert_eq!(early.now_or_never(), Some(()));
        block_on(second);

        let late = window.when_defined("x-later").unwrap();
        assert!(late.is_resolved());
        assert_eq!(late.now_or_never(), Some(()));
    }

    #[test]
    fn test_failed_define_does_not_resolve_waiters() {
        let mut window = window();
        window.define::<Foo>("x-foo").unwrap();
        let mut waiter = window.when_defined("x-other").unwrap();
        assert!(window.define::<Foo>("x-other").is_err());
        assert!((&mut waiter).now_or_never().is_none());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PATCHED TREE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_define_upgrades_then_remove_disconnects_synchronously() {
        let mut window = window();
        let document = window.document();
        let node = window.create_element("x-foo");
        window.append_child(document, node).unwrap();
        assert!(!window.is_instance::<Foo>(node));

        window.define::<Foo>("x-foo").unwrap();
        assert!(window.is_instance::<Foo>(node));
        assert_eq!(foo(&window, node).connected, 1);

        window.run_microtasks();
        assert_eq!(foo(&window, node).connected, 1);

        window.remove_child(document, node).unwrap();
        assert_eq!(foo(&window, node).disconnected, 1);

        window.run_microtasks();
        assert_eq!(foo(&window, node).disconnected, 1);
        assert_eq!(foo(&window, node).connected, 1);
    }

    #[test]
    fn test_create_element_constructs_defined_names() {
        let mut window = window();
        window.define::<Foo>("x-foo").unwrap();
        let node = window.create_element("x-foo");
        assert!(window.is_instance::<Foo>(node));
        assert_eq!(foo(&window, node).connected, 0);
        assert_eq!(window.dom().parent(node), None);
    }

    #[test]
    fn test_inner_html_connects_every_match() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();
        let container = window.create_element("div");
        window.append_child(document, container).unwrap();

        window
            .set_inner_html(container, "<x-foo></x-foo><span><x-foo></x-foo></span>")
            .unwrap();
        let foos = find(&window, container, "x-foo");
        assert_eq!(foos.len(), 2);
        for node in &foos {
            assert_eq!(foo(&window, *node).connected, 1);
        }

        window.set_inner_html(container, "").unwrap();
        for node in &foos {
            assert_eq!(foo(&window, *node).disconnected, 1);
        }
    }

    #[test]
    fn test_replace_child_swaps_lifecycle() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();
        let old = window.create_element("x-foo");
        let new = window.create_element("x-foo");
        window.append_child(document, old).unwrap();

        assert_eq!(window.replace_child(document, new, old).unwrap(), old);
        assert_eq!(foo(&window, old).disconnected, 1);
        assert_eq!(foo(&window, new).connected, 1);
        assert_eq!(window.dom().children(document), &[new]);
    }

    #[test]
    fn test_insert_before_moves_connected_subtree() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();
        let first = window.create_element("div");
        let second = window.create_element("div");
        window.append_child(document, first).unwrap();
        window.append_child(document, second).unwrap();
        let node = window.create_element("x-foo");
        window.append_child(first, node).unwrap();

        window.insert_before(second, node, None).unwrap();
        assert_eq!(window.dom().parent(node), Some(second));
        assert_eq!(foo(&window, node).connected, 2);
        assert_eq!(foo(&window, node).disconnected, 1);
    }

    #[test]
    fn test_template_clones_stay_inert_until_imported() {
        init_tracing();
        let mut window = Window::parse(
            RegistryConfig::default(),
            "<template><x-foo></x-foo></template><body></body>",
        )
        .unwrap();
        window.define::<Foo>("x-foo").unwrap();

        let template = find(&window, window.document(), "template")[0];
        let content = window.dom().template_content(template).unwrap();
        let original = window.dom().children(content)[0];
        assert!(!window.dom().is_upgraded(original));

        let clone = window.clone_node(content, true).unwrap();
        let cloned = window.dom().children(clone)[0];
        assert!(!window.dom().is_upgraded(cloned));

        let imported = window.import_node(content, true).unwrap();
        let imported_foo = window.dom().children(imported)[0];
        assert!(window.is_instance::<Foo>(imported_foo));
        assert_eq!(foo(&window, imported_foo).connected, 0);

        let body = find(&window, window.document(), "body")[0];
        window.append_child(body, imported).unwrap();
        assert_eq!(window.dom().parent(imported_foo), Some(body));
        assert_eq!(foo(&window, imported_foo).connected, 1);
    }

    #[test]
    fn test_element_code_can_render_through_patched_tree() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();
        window.define::<Card>("x-card").unwrap();

        let card = window.create_element("x-card");
        window.append_child(document, card).unwrap();

        let badge = window.dom().children(card)[0];
        assert!(window.is_instance::<Foo>(badge));
        assert_eq!(foo(&window, badge).connected, 1);
        assert_eq!(window.dom().outer_html(card), "<x-card><x-foo></x-foo></x-card>");
    }

    #[test]
    fn test_shadow_roots_attached_through_window_are_observed() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();
        let host = window.create_element("div");
        window.append_child(document, host).unwrap();
        let shadow = window.attach_shadow(host).unwrap();

        let node = window.dom_mut().create_element("x-foo");
        window.dom_mut().append_child(shadow, node).unwrap();
        assert!(!window.dom().is_upgraded(node));

        window.run_microtasks();
        assert_eq!(foo(&window, node).connected, 1);
    }

    #[test]
    fn test_hooks_in_shadow_trees_see_connection() {
        let mut window = window();
        let document = window.document();
        window.define::<Witness>("x-witness").unwrap();
        let host = window.create_element("div");
        window.append_child(document, host).unwrap();
        let shadow = window.attach_shadow(host).unwrap();

        let node = window.create_element("x-witness");
        window.append_child(shadow, node).unwrap();
        assert!(window.dom().is_connected(node));
        assert_eq!(
            window.element::<Witness>(node).unwrap().seen_connected,
            Some(true)
        );

        let detached_host = window.create_element("div");
        let detached_shadow = window.attach_shadow(detached_host).unwrap();
        let orphan = window.create_element("span");
        window.append_child(detached_shadow, orphan).unwrap();
        assert!(!window.dom().is_connected(orphan));
    }

    #[test]
    fn test_host_cannot_enter_its_own_shadow_tree() {
        let mut window = window();
        let host = window.create_element("div");
        let shadow = window.attach_shadow(host).unwrap();
        assert!(window.append_child(shadow, host).is_err());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MICROTASKS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_native_mutations_reconciled_at_microtask() {
        let mut window = window();
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();

        let container = window.dom_mut().create_element("div");
        window
            .dom_mut()
            .set_inner_html(container, "<x-foo></x-foo><x-foo></x-foo>")
            .unwrap();
        window.dom_mut().append_child(document, container).unwrap();
        let foos = window.dom().children(container).to_vec();
        assert!(foos.iter().all(|n| !window.dom().is_upgraded(*n)));

        window.run_microtasks();
        for node in &foos {
            assert_eq!(foo(&window, *node).connected, 1);
        }
    }

    #[test]
    fn test_hook_errors_surface_after_microtask() {
        let mut window = window();
        let document = window.document();
        window.define::<Grumpy>("x-grumpy").unwrap();
        window.define::<Foo>("x-foo").unwrap();

        let fragment = window.dom_mut().create_document_fragment();
        let grumpy = window.create_element("x-grumpy");
        let sibling = window.create_element("x-foo");
        window.dom_mut().append_child(fragment, grumpy).unwrap();
        window.dom_mut().append_child(fragment, sibling).unwrap();

        window.append_child(document, fragment).unwrap();
        assert_eq!(foo(&window, sibling).connected, 1);
        assert_eq!(window.dom().parent(grumpy), Some(document));
        assert!(window.take_uncaught_errors().is_empty());

        window.run_microtasks();
        assert_eq!(
            window.take_uncaught_errors(),
            vec![RegistryError::Callback(CallbackError {
                hook: Hook::Connected,
                name: "x-grumpy".to_string(),
                node: grumpy,
                source: ElementError::new("not today"),
            })]
        );
    }

    #[test]
    fn test_construct_requires_definition() {
        let mut window = window();
        assert!(matches!(
            window.construct::<Foo>(),
            Err(RegistryError::Construction(ConstructionError::NotDefined { .. }))
        ));

        window.define::<Foo>("x-foo").unwrap();
        let node = window.construct::<Foo>().unwrap();
        assert_eq!(window.dom().local_name(node), Some("x-foo"));
        window.element_mut::<Foo>(node).unwrap().connected = 41;
        let document = window.document();
        window.append_child(document, node).unwrap();
        assert_eq!(foo(&window, node).connected, 42);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // INSTALL MODES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_native_mode_reconciles_synchronously() {
        init_tracing();
        let config =
            RegistryConfig::from_json(r#"{"nativeLifecycle": true, "sampleConstructor": "native"}"#)
                .unwrap();
        let mut window = Window::new(config);
        assert_eq!(window.install_mode(), InstallMode::Native);
        assert!(window.install_mode().host_lifecycle());
        assert!(!window.install_mode().uses_trampoline());
        let document = window.document();
        window.define::<Foo>("x-foo").unwrap();

        let node = window.create_element("x-foo");
        assert!(window.is_instance::<Foo>(node));

        window.append_child(document, node).unwrap();
        assert_eq!(foo(&window, node).connected, 1);

        window.remove_child(document, node).unwrap();
        assert_eq!(foo(&window, node).disconnected, 1);
    }

    #[test]
    fn test_deferred_mode_resolves_on_first_define() {
        init_tracing();
        let mut window = Window::new(RegistryConfig {
            native_lifecycle: true,
            sample_constructor: None,
        });
        assert_eq!(window.install_mode(), InstallMode::Deferred);

        window.define::<Legacy>("x-legacy").unwrap();
        assert_eq!(window.install_mode(), InstallMode::WrapperOnly);
        assert!(window.install_mode().uses_trampoline());

        let document = window.document();
        let node = window.create_element("x-legacy");
        window.append_child(document, node).unwrap();
        assert!(window.is_instance::<Legacy>(node));

        window.define::<Foo>("x-foo").unwrap();
        assert_eq!(window.install_mode(), InstallMode::WrapperOnly);
    }

    #[test]
    fn test_upgrade_leaves_connection_to_caller() {
        let mut window = window();
        window.define::<Foo>("x-foo").unwrap();
        let detached = window.dom_mut().create_element("div");
        window
            .dom_mut()
            .set_inner_html(detached, "<x-foo></x-foo>")
            .unwrap();
        let node = window.dom().children(detached)[0];

        window.upgrade(detached);
        assert!(window.is_instance::<Foo>(node));
        assert_eq!(foo(&window, node).connected, 0);
    }
}
