//! Runtime type identity.
//!
//! A [`TypeToken`] is the mapper's stand-in for reflection metadata: it
//! names a type, records which component defined it (via an
//! [`OriginSignature`]), and declares the scalar kind and iterable
//! capabilities classification works from. Tokens are produced by the
//! [`TypeInfo`] trait; this module provides implementations for the
//! platform types (scalars, `String`, `Option`, `Vec`, `VecDeque`,
//! fixed-size arrays).
//!
//! Identity is keyed by `TypeId`. Display *names* are a separate axis:
//! the engine compares property type names the way the original runtime
//! compared reflected type names, so two distinct types may legitimately
//! share a name.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::VecDeque;

use bitflags::bitflags;

bitflags! {
    /// Iterable capabilities a type declares.
    ///
    /// These mirror the capability probes the original runtime performed
    /// against a type's interface list. A type may declare several; the
    /// classifier resolves them with a fixed precedence.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct IterableCaps: u8 {
        /// Fixed-size positional storage (`[T; N]`).
        const ARRAY = 1;
        /// Generic collection of a known element type.
        const COLLECTION_OF = 1 << 1;
        /// Generic list of a known element type.
        const LIST_OF = 1 << 2;
        /// Generic sequence of a known element type.
        const SEQUENCE_OF = 1 << 3;
        /// Legacy sequence with no element-type information.
        const SEQUENCE = 1 << 4;
        /// Legacy collection with no element-type information.
        const COLLECTION = 1 << 5;
        /// Legacy list with no element-type information.
        const LIST = 1 << 6;
        /// Textual character sequence; never classified as a sequence.
        const TEXTUAL = 1 << 7;
    }
}

/// 8-byte public-key identity of the component that defines a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OriginSignature(pub [u8; 8]);

impl OriginSignature {
    /// Signature assigned to user-defined domain types.
    pub const LOCAL: OriginSignature = OriginSignature([0; 8]);
}

/// Origin signature of the language core component.
pub const CORE_ORIGIN: OriginSignature =
    OriginSignature([0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]);

/// Origin signature of the standard library component.
pub const STD_ORIGIN: OriginSignature =
    OriginSignature([0x31, 0xbf, 0x38, 0x56, 0xad, 0x36, 0x4e, 0x35]);

/// Origin signature of the allocation/collections component.
pub const ALLOC_ORIGIN: OriginSignature =
    OriginSignature([0xb0, 0x3f, 0x5f, 0x7f, 0x11, 0xd5, 0x0a, 0x3a]);

/// Scalar value category of a type, used to drive value coercion.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
}

/// Runtime identity of a mappable type.
///
/// Cheap to clone; equality and hashing are keyed by `TypeId` only.
/// Element and inner tokens are stored as thunks so self-referential
/// container declarations do not recurse at construction time.
#[derive(Clone, Debug)]
pub struct TypeToken {
    id: TypeId,
    name: Cow<'static, str>,
    origin: OriginSignature,
    scalar: Option<ScalarKind>,
    caps: IterableCaps,
    element: Option<fn() -> TypeToken>,
    inner: Option<fn() -> TypeToken>,
}

impl TypeToken {
    /// Token for a scalar platform type.
    pub fn scalar_token<T: 'static>(
        name: &'static str,
        kind: ScalarKind,
        origin: OriginSignature,
    ) -> Self {
        TypeToken {
            id: TypeId::of::<T>(),
            name: Cow::Borrowed(name),
            origin,
            scalar: Some(kind),
            caps: IterableCaps::empty(),
            element: None,
            inner: None,
        }
    }

    /// Token for a user-defined composite type.
    pub fn composite<T: 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        TypeToken {
            id: TypeId::of::<T>(),
            name: name.into(),
            origin: OriginSignature::LOCAL,
            scalar: None,
            caps: IterableCaps::empty(),
            element: None,
            inner: None,
        }
    }

    /// Token for a sequence type with the given capabilities.
    ///
    /// For untyped legacy kinds the element thunk is never consulted; the
    /// classifier reports the container token itself as the element.
    pub fn sequence<T: 'static>(
        name: impl Into<Cow<'static, str>>,
        origin: OriginSignature,
        caps: IterableCaps,
        element: fn() -> TypeToken,
    ) -> Self {
        TypeToken {
            id: TypeId::of::<T>(),
            name: name.into(),
            origin,
            scalar: None,
            caps,
            element: Some(element),
            inner: None,
        }
    }

    /// Token for a nullable wrapper around `inner`.
    ///
    /// The wrapper inherits the payload's origin and scalar kind so that
    /// `Option<i64>` coerces and gates exactly like `i64`.
    pub fn nullable<T: 'static>(
        name: impl Into<Cow<'static, str>>,
        inner: fn() -> TypeToken,
    ) -> Self {
        let payload = inner();
        TypeToken {
            id: TypeId::of::<T>(),
            name: name.into(),
            origin: payload.origin,
            scalar: payload.scalar,
            caps: IterableCaps::empty(),
            element: None,
            inner: Some(inner),
        }
    }

    /// Override the declared capabilities.
    pub fn with_caps(mut self, caps: IterableCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Override the origin signature.
    pub fn with_origin(mut self, origin: OriginSignature) -> Self {
        self.origin = origin;
        self
    }

    /// Attach an element thunk.
    pub fn with_element(mut self, element: fn() -> TypeToken) -> Self {
        self.element = Some(element);
        self
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> OriginSignature {
        self.origin
    }

    pub fn scalar(&self) -> Option<ScalarKind> {
        self.scalar
    }

    pub fn caps(&self) -> IterableCaps {
        self.caps
    }

    /// Declared element token, for typed sequences.
    pub fn element_token(&self) -> Option<TypeToken> {
        self.element.map(|thunk| thunk())
    }

    /// Payload token, for nullable wrappers.
    pub fn inner_token(&self) -> Option<TypeToken> {
        self.inner.map(|thunk| thunk())
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl std::hash::Hash for TypeToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Source of a type's [`TypeToken`].
///
/// Implemented for the platform types here and for domain types via the
/// `reflect_struct!` macro in `graft_map`.
pub trait TypeInfo: 'static {
    /// The token describing this type.
    fn token() -> TypeToken;
}

macro_rules! scalar_type_info {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl TypeInfo for $ty {
                fn token() -> TypeToken {
                    TypeToken::scalar_token::<$ty>(stringify!($ty), ScalarKind::$kind, CORE_ORIGIN)
                }
            }
        )+
    };
}

scalar_type_info! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
}

impl TypeInfo for String {
    fn token() -> TypeToken {
        // Strings satisfy the typed-sequence capability over chars but are
        // excluded from sequence classification by the TEXTUAL flag.
        TypeToken::scalar_token::<String>("String", ScalarKind::Str, ALLOC_ORIGIN)
            .with_caps(IterableCaps::SEQUENCE_OF | IterableCaps::TEXTUAL)
            .with_element(char::token)
    }
}

impl<T: TypeInfo> TypeInfo for Option<T> {
    fn token() -> TypeToken {
        let inner = T::token();
        TypeToken::nullable::<Option<T>>(format!("Option<{}>", inner.name()), T::token)
    }
}

impl<T: TypeInfo> TypeInfo for Vec<T> {
    fn token() -> TypeToken {
        TypeToken::sequence::<Vec<T>>(
            format!("Vec<{}>", T::token().name()),
            ALLOC_ORIGIN,
            IterableCaps::COLLECTION_OF | IterableCaps::LIST_OF | IterableCaps::SEQUENCE_OF,
            T::token,
        )
    }
}

impl<T: TypeInfo> TypeInfo for VecDeque<T> {
    fn token() -> TypeToken {
        TypeToken::sequence::<VecDeque<T>>(
            format!("VecDeque<{}>", T::token().name()),
            ALLOC_ORIGIN,
            IterableCaps::COLLECTION_OF | IterableCaps::SEQUENCE_OF,
            T::token,
        )
    }
}

impl<T: TypeInfo, const N: usize> TypeInfo for [T; N] {
    fn token() -> TypeToken {
        TypeToken::sequence::<[T; N]>(
            format!("[{}; {N}]", T::token().name()),
            CORE_ORIGIN,
            IterableCaps::ARRAY,
            T::token,
        )
    }
}
