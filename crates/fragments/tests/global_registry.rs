//! Hosts that do not bring their own registry use the process-wide one.

use fragments::{
    actions, ClassId, Fragment, FragmentClass, FragmentError, FragmentHost, FragmentRegistry,
    FragmentState, HostContext, NoOptions, FRAGMENT_NAMESPACE, FRAMEWORK_NAMESPACE,
};
use fragments_render::{TemplateRegistry, ViewFactory};
use serial_test::serial;

#[derive(Fragment)]
struct FooterFragment {
    state: FragmentState,
    source: &'static str,
}

#[actions]
impl FooterFragment {
    pub fn display(&mut self) -> Result<(), FragmentError> {
        let source = self.source;
        self.state.set("source", source)
    }
}

impl FragmentClass for FooterFragment {
    type Options = NoOptions;

    fn create(state: FragmentState, _: NoOptions) -> Result<Self, FragmentError> {
        Ok(Self {
            state,
            source: "footer",
        })
    }
}

struct Layout {
    ctx: HostContext,
}

impl FragmentHost for Layout {
    fn host_context(&self) -> &HostContext {
        &self.ctx
    }
}

fn layout() -> Layout {
    let mut templates = TemplateRegistry::new();
    templates.add_inline("Fragment/Footer/display", "from {{ source }}");
    Layout {
        ctx: HostContext::new(ViewFactory::new(templates)),
    }
}

#[test]
#[serial]
fn test_default_context_uses_global_registry() {
    let global = FragmentRegistry::global();
    global.clear();

    let host = layout();
    assert!(matches!(
        host.fragment("Footer", (), ()),
        Err(FragmentError::MissingFragmentClass { .. })
    ));

    global.register::<FooterFragment>().unwrap();
    let mut footer = host.fragment("Footer", (), ()).unwrap();
    assert_eq!(footer.render(None).unwrap(), "from footer");

    global.clear();
}

#[test]
#[serial]
fn test_framework_namespace_fallback() {
    let global = FragmentRegistry::global();
    global.clear();

    let id = global.register_in::<FooterFragment>(FRAMEWORK_NAMESPACE).unwrap();
    assert_eq!(id, ClassId::new("Fragments", FRAGMENT_NAMESPACE, "FooterFragment"));

    let mut footer = layout().fragment("Footer", (), ()).unwrap();
    assert_eq!(footer.render_or_empty(), "from footer");

    global.clear();
}
