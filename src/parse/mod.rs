//! Adapters die blend-space definities inlezen.

pub mod blend_space_xml;
