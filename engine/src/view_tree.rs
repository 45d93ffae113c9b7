use serde::{Deserialize, Serialize};

use crate::ui::Rect;

/// Clickable regions produced for one frame, in paint order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewTree<A> {
    pub nodes: Vec<ViewNode<A>>,
}

impl<A> Default for ViewTree<A> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<A> ViewTree<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ViewNode<A>) {
        self.nodes.push(node);
    }

    pub fn push_button(&mut self, id: u32, rect: Rect, action: A) {
        self.nodes.push(ViewNode::Button(ButtonNode {
            id,
            rect,
            action,
            enabled: true,
        }));
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ButtonNode<A>> {
        self.nodes.iter().filter_map(|node| match node {
            ViewNode::Button(button) => Some(button),
            ViewNode::Blocker(_) => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ViewNode<A> {
    Button(ButtonNode<A>),
    /// Swallows clicks for everything painted beneath it (modal backdrops).
    Blocker(Rect),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonNode<A> {
    pub id: u32,
    pub rect: Rect,
    pub action: A,
    pub enabled: bool,
}

/// Returns the action of the topmost enabled button under `pos`.
pub fn hit_test<A: Clone>(view: &ViewTree<A>, pos: (u32, u32)) -> Option<A> {
    let (x, y) = pos;
    for node in view.nodes.iter().rev() {
        match node {
            ViewNode::Button(button) if button.enabled && button.rect.contains(x, y) => {
                return Some(button.action.clone());
            }
            ViewNode::Blocker(rect) if rect.contains(x, y) => return None,
            _ => {}
        }
    }
    None
}
