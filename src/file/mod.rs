// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! On-disk reader plumbing: footer parsing, the metadata model, the
//! `FileReader`/`RowGroupReader`/`ChunkReader` traits and their serialized
//! implementation, reader configuration, and the row-reader driver built on
//! top of all of it.

pub mod footer;
pub mod metadata;
pub mod properties;
pub mod reader;
pub mod row_reader;
pub mod serialized_reader;

pub use metadata::{ColumnChunkMetaData, FileMetaData, ParquetMetaData, RowGroupMetaData};
pub use properties::{ReaderProperties, ReaderPropertiesBuilder};
pub use reader::{ChunkReader, ChunkSource, FileReader, Length, RowGroupReader};
pub use row_reader::RowReader;
pub use serialized_reader::SerializedFileReader;
