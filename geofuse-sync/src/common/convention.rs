use glam::{DMat3, DMat4, DVec3};
use itertools::iproduct;
use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConventionError {
    #[error("globe matrices are documented as {documented}, convention declares {declared}")]
    GlobeLayoutMismatch {
        documented: MatrixLayout,
        declared: MatrixLayout,
    },
    #[error("mesh matrices are documented as {documented}, convention declares {declared}")]
    MeshLayoutMismatch {
        documented: MatrixLayout,
        declared: MatrixLayout,
    },
    #[error("axes {0:?} are not a signed permutation of X, Y and Z")]
    NotAPermutation([SignedAxis; 3]),
    #[error("axes {0:?} mirror the frame")]
    Mirroring([SignedAxis; 3]),
}

/// Storage order of the 16 scalars of a 4x4 matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumString, Display, Deserialize)]
pub enum MatrixLayout {
    /// `[c0r0, c0r1, c0r2, c0r3, c1r0, ...]`
    ColumnMajor,
    /// `[r0c0, r0c1, r0c2, r0c3, r1c0, ...]`
    RowMajor,
}

impl MatrixLayout {
    pub fn index(&self, row: usize, col: usize) -> usize {
        match self {
            MatrixLayout::ColumnMajor => col * 4 + row,
            MatrixLayout::RowMajor => row * 4 + col,
        }
    }

    pub fn decode(&self, elements: &[f64; 16]) -> DMat4 {
        let column_major = relayout(*self, MatrixLayout::ColumnMajor, elements);
        DMat4::from_cols_array(&column_major)
    }

    pub fn encode(&self, matrix: &DMat4) -> [f64; 16] {
        relayout(MatrixLayout::ColumnMajor, *self, &matrix.to_cols_array())
    }
}

/// Moves every `(row, col)` element from its `source` index to its `target` index.
/// Between different layouts this is a transpose of the flat array, so applying it
/// twice with swapped layouts is the identity.
pub fn relayout(source: MatrixLayout, target: MatrixLayout, elements: &[f64; 16]) -> [f64; 16] {
    if source == target {
        return *elements;
    }

    let mut out = [0.0; 16];
    for (row, col) in iproduct!(0..4, 0..4) {
        out[target.index(row, col)] = elements[source.index(row, col)];
    }
    out
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumString, Display, Deserialize)]
pub enum SignedAxis {
    #[strum(serialize = "+X")]
    #[serde(rename = "+X")]
    PosX,
    #[strum(serialize = "-X")]
    #[serde(rename = "-X")]
    NegX,
    #[strum(serialize = "+Y")]
    #[serde(rename = "+Y")]
    PosY,
    #[strum(serialize = "-Y")]
    #[serde(rename = "-Y")]
    NegY,
    #[strum(serialize = "+Z")]
    #[serde(rename = "+Z")]
    PosZ,
    #[strum(serialize = "-Z")]
    #[serde(rename = "-Z")]
    NegZ,
}

impl SignedAxis {
    pub fn to_vec(&self) -> DVec3 {
        match self {
            SignedAxis::PosX => DVec3::X,
            SignedAxis::NegX => DVec3::NEG_X,
            SignedAxis::PosY => DVec3::Y,
            SignedAxis::NegY => DVec3::NEG_Y,
            SignedAxis::PosZ => DVec3::Z,
            SignedAxis::NegZ => DVec3::NEG_Z,
        }
    }

    fn axis_index(&self) -> usize {
        match self {
            SignedAxis::PosX | SignedAxis::NegX => 0,
            SignedAxis::PosY | SignedAxis::NegY => 1,
            SignedAxis::PosZ | SignedAxis::NegZ => 2,
        }
    }
}

/// Where the globe's X, Y and Z world axes point in the mesh world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AxisPermutation(pub [SignedAxis; 3]);

impl Default for AxisPermutation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AxisPermutation {
    pub const IDENTITY: AxisPermutation =
        AxisPermutation([SignedAxis::PosX, SignedAxis::PosY, SignedAxis::PosZ]);

    pub fn validate(&self) -> Result<(), ConventionError> {
        let mut seen = [false; 3];
        for axis in self.0 {
            seen[axis.axis_index()] = true;
        }
        if seen.contains(&false) {
            return Err(ConventionError::NotAPermutation(self.0));
        }
        if self.rotation().determinant() < 0.0 {
            return Err(ConventionError::Mirroring(self.0));
        }
        Ok(())
    }

    pub fn rotation(&self) -> DMat3 {
        let [x, y, z] = self.0;
        DMat3::from_cols(x.to_vec(), y.to_vec(), z.to_vec())
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Declared relationship between the globe's and the mesh renderer's matrix
/// storage and world axes.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConvention {
    pub globe_layout: MatrixLayout,
    pub mesh_layout: MatrixLayout,
    pub axes: AxisPermutation,
}

impl Default for FrameConvention {
    fn default() -> Self {
        Self {
            globe_layout: MatrixLayout::ColumnMajor,
            mesh_layout: MatrixLayout::RowMajor,
            axes: AxisPermutation::IDENTITY,
        }
    }
}

impl FrameConvention {
    pub fn validate_against(
        &self,
        globe_documented: MatrixLayout,
        mesh_documented: MatrixLayout,
    ) -> Result<(), ConventionError> {
        if globe_documented != self.globe_layout {
            return Err(ConventionError::GlobeLayoutMismatch {
                documented: globe_documented,
                declared: self.globe_layout,
            });
        }
        if mesh_documented != self.mesh_layout {
            return Err(ConventionError::MeshLayoutMismatch {
                documented: mesh_documented,
                declared: self.mesh_layout,
            });
        }
        self.axes.validate()
    }

    pub fn decode_globe(&self, elements: &[f64; 16]) -> DMat4 {
        self.globe_layout.decode(elements)
    }

    pub fn encode_mesh(&self, matrix: &DMat4) -> [f64; 16] {
        self.mesh_layout.encode(matrix)
    }

    pub fn decode_mesh(&self, elements: &[f64; 16]) -> DMat4 {
        self.mesh_layout.decode(elements)
    }

    fn axes_matrix(&self) -> DMat4 {
        DMat4::from_mat3(self.axes.rotation())
    }

    /// Local-to-world matrix expressed in the mesh world.
    pub fn world_to_mesh(&self, world: DMat4) -> DMat4 {
        if self.axes.is_identity() {
            world
        } else {
            self.axes_matrix() * world
        }
    }

    /// World-to-local matrix expressed in the mesh world.
    pub fn inverse_to_mesh(&self, inverse: DMat4) -> DMat4 {
        if self.axes.is_identity() {
            inverse
        } else {
            inverse * self.axes_matrix().transpose()
        }
    }

    pub fn point_to_mesh(&self, point: DVec3) -> DVec3 {
        if self.axes.is_identity() {
            point
        } else {
            self.axes.rotation() * point
        }
    }

    pub fn direction_to_mesh(&self, direction: DVec3) -> DVec3 {
        self.point_to_mesh(direction)
    }
}
